//! Supports reading and writing the configuration as YAML (optional)

use std::path::Path;
use serde::Deserialize;
use serde_saphyr::Options;

use crate::config::PandaConfig;
use crate::error::PandaError;
use crate::ik_solver::IkSolver;
use crate::kinematic_traits::DOF;

#[derive(Deserialize, Default)]
#[serde(default)]
struct LevenbergMarquardtYaml {
    pub max_iterations: Option<usize>,
    pub step_size: Option<f64>,
    pub damping: Option<f64>,
    pub abs_err_tolerance: Option<f64>,
    pub rel_err_tolerance: Option<f64>,
    pub epsilon: Option<f64>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct JacobianYaml {
    pub max_iterations: Option<usize>,
    pub step_size: Option<f64>,
    pub tolerance: Option<f64>,
    pub pinv_epsilon: Option<f64>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct PinocchioCpuYaml {
    pub max_iterations: Option<usize>,
    pub step_size: Option<f64>,
    pub damping: Option<f64>,
    pub tolerance: Option<f64>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct JointLimitsYaml {
    pub lower: Option<Vec<f64>>,
    pub upper: Option<Vec<f64>>,
    pub velocity: Option<Vec<f64>>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CartesianLimitsYaml {
    pub lower: Option<Vec<f64>>,
    pub upper: Option<Vec<f64>>,
}

/// Every key is optional, absent ones keep the value of [PandaConfig::default].
#[derive(Deserialize, Default)]
#[serde(default)]
struct Root {
    pub default_solver: Option<String>,
    pub rtol: Option<f64>,
    pub atol: Option<f64>,
    pub max_steps: Option<usize>,
    pub verbose: Option<bool>,
    pub levenberg_marquardt: Option<LevenbergMarquardtYaml>,
    pub jacobian: Option<JacobianYaml>,
    pub pinocchio_cpu: Option<PinocchioCpuYaml>,
    pub joint_limits: Option<JointLimitsYaml>,
    pub cartesian_limits: Option<CartesianLimitsYaml>,
}

impl PandaConfig {
    /// Read the configuration from YAML file. YAML file like this is supported:
    /// ```yaml
    /// default_solver: cpu
    /// rtol: 0
    /// atol: 0.0001
    /// max_steps: 200
    /// verbose: false
    /// levenberg_marquardt:
    ///   max_iterations: 20
    ///   step_size: 0.5
    ///   damping: 0.001
    ///   abs_err_tolerance: 1e-10
    ///   rel_err_tolerance: 1e-8
    ///   epsilon: 1e-7
    /// jacobian:
    ///   max_iterations: 50
    ///   step_size: 0.2
    ///   tolerance: 0.0001
    ///   pinv_epsilon: 1e-10
    /// pinocchio_cpu:
    ///   max_iterations: 1000
    ///   step_size: 0.1
    ///   damping: 1e-12
    ///   tolerance: 0.0005
    /// joint_limits:
    ///   lower: [deg(-166.0), -1.7628, -2.8973, -3.0718, -2.8973, -0.0175, -2.8973]
    ///   upper: [deg(166.0), 1.7628, 2.0, -0.0698, 2.8973, 3.7525, 2.8973]
    ///   velocity: [2.175, 2.175, 2.175, 2.175, 2.61, 2.61, 2.61]
    /// cartesian_limits:
    ///   lower: [0.1, -0.4, -0.05]
    ///   upper: [1.0, 0.4, 1.0]
    /// ```
    /// Every key is optional, missing ones keep the default value. Angles may be given
    /// in degrees with the deg(angle) function (serde_saphyr).
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, PandaError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, PandaError> {
        let mut config = PandaConfig::default();
        if contents.trim().is_empty() {
            return Ok(config);
        }
        let root: Root = serde_saphyr::from_str_with_options(
            contents,
            Options { angle_conversions: true, ..Default::default() }
        ).map_err(|e| PandaError::ParseError(format!("{}", e)))?;

        if let Some(name) = root.default_solver {
            if name.trim().is_empty() {
                return Err(PandaError::MissingField("default_solver".to_string()));
            }
            config.default_solver = IkSolver::resolve(&name, config.default_solver);
        }
        if let Some(v) = root.rtol { config.rtol = finite(v, "rtol")?; }
        if let Some(v) = root.atol { config.atol = finite(v, "atol")?; }
        if let Some(v) = root.max_steps { config.max_steps = v; }
        if let Some(v) = root.verbose { config.verbose = v; }

        if let Some(lm) = root.levenberg_marquardt {
            let target = &mut config.levenberg_marquardt;
            if let Some(v) = lm.max_iterations { target.max_iterations = v; }
            if let Some(v) = lm.step_size { target.step_size = finite(v, "levenberg_marquardt.step_size")?; }
            if let Some(v) = lm.damping { target.damping = finite(v, "levenberg_marquardt.damping")?; }
            if let Some(v) = lm.abs_err_tolerance { target.abs_err_tolerance = finite(v, "levenberg_marquardt.abs_err_tolerance")?; }
            if let Some(v) = lm.rel_err_tolerance { target.rel_err_tolerance = finite(v, "levenberg_marquardt.rel_err_tolerance")?; }
            if let Some(v) = lm.epsilon { target.epsilon = finite(v, "levenberg_marquardt.epsilon")?; }
        }

        if let Some(jacobian) = root.jacobian {
            let target = &mut config.jacobian;
            if let Some(v) = jacobian.max_iterations { target.max_iterations = v; }
            if let Some(v) = jacobian.step_size { target.step_size = finite(v, "jacobian.step_size")?; }
            if let Some(v) = jacobian.tolerance { target.tolerance = finite(v, "jacobian.tolerance")?; }
            if let Some(v) = jacobian.pinv_epsilon { target.pinv_epsilon = finite(v, "jacobian.pinv_epsilon")?; }
        }

        if let Some(cpu) = root.pinocchio_cpu {
            let target = &mut config.pinocchio_cpu;
            if let Some(v) = cpu.max_iterations { target.max_iterations = v; }
            if let Some(v) = cpu.step_size { target.step_size = finite(v, "pinocchio_cpu.step_size")?; }
            if let Some(v) = cpu.damping { target.damping = finite(v, "pinocchio_cpu.damping")?; }
            if let Some(v) = cpu.tolerance { target.tolerance = finite(v, "pinocchio_cpu.tolerance")?; }
        }

        if let Some(limits) = root.joint_limits {
            let target = &mut config.joint_limits;
            if let Some(v) = limits.lower { target.lower = vec_to_array::<DOF>(v, "joint_limits.lower")?; }
            if let Some(v) = limits.upper { target.upper = vec_to_array::<DOF>(v, "joint_limits.upper")?; }
            if let Some(v) = limits.velocity { target.velocity = vec_to_array::<DOF>(v, "joint_limits.velocity")?; }
        }
        config.pinocchio_cpu.limits = config.joint_limits;

        if let Some(limits) = root.cartesian_limits {
            let target = &mut config.cartesian_limits;
            if let Some(v) = limits.lower { target.lower = vec_to_array::<3>(v, "cartesian_limits.lower")?; }
            if let Some(v) = limits.upper { target.upper = vec_to_array::<3>(v, "cartesian_limits.upper")?; }
        }

        Ok(config)
    }

    /// Dumps the configuration in the format [PandaConfig::from_yaml_file] reads.
    pub fn to_yaml(&self) -> String {
        let lm = &self.levenberg_marquardt;
        let jacobian = &self.jacobian;
        let cpu = &self.pinocchio_cpu;
        format!(
            "default_solver: {}\n\
            rtol: {}\n\
            atol: {}\n\
            max_steps: {}\n\
            verbose: {}\n\
            levenberg_marquardt:\n  \
              max_iterations: {}\n  \
              step_size: {}\n  \
              damping: {}\n  \
              abs_err_tolerance: {}\n  \
              rel_err_tolerance: {}\n  \
              epsilon: {}\n\
            jacobian:\n  \
              max_iterations: {}\n  \
              step_size: {}\n  \
              tolerance: {}\n  \
              pinv_epsilon: {}\n\
            pinocchio_cpu:\n  \
              max_iterations: {}\n  \
              step_size: {}\n  \
              damping: {}\n  \
              tolerance: {}\n\
            joint_limits:\n  \
              lower: [{}]\n  \
              upper: [{}]\n  \
              velocity: [{}]\n\
            cartesian_limits:\n  \
              lower: [{}]\n  \
              upper: [{}]\n",
            self.default_solver,
            self.rtol,
            self.atol,
            self.max_steps,
            self.verbose,
            lm.max_iterations,
            lm.step_size,
            lm.damping,
            lm.abs_err_tolerance,
            lm.rel_err_tolerance,
            lm.epsilon,
            jacobian.max_iterations,
            jacobian.step_size,
            jacobian.tolerance,
            jacobian.pinv_epsilon,
            cpu.max_iterations,
            cpu.step_size,
            cpu.damping,
            cpu.tolerance,
            join(&self.joint_limits.lower),
            join(&self.joint_limits.upper),
            join(&self.joint_limits.velocity),
            join(&self.cartesian_limits.lower),
            join(&self.cartesian_limits.upper),
        )
    }
}

fn join(values: &[f64]) -> String {
    values.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(", ")
}

fn finite(value: f64, field: &str) -> Result<f64, PandaError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PandaError::ParseError(format!("{} must be finite (got {})", field, value)))
    }
}

fn vec_to_array<const N: usize>(values: Vec<f64>, field: &str) -> Result<[f64; N], PandaError> {
    let found = values.len();
    let array: [f64; N] = values
        .try_into()
        .map_err(|_| PandaError::InvalidLength { expected: N, found })?;
    for (i, &value) in array.iter().enumerate() {
        finite(value, &format!("{}[{}]", field, i))?;
    }
    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = PandaConfig::from_yaml_str("").expect("empty document is valid");
        assert_eq!(config, PandaConfig::default());
    }

    #[test]
    fn test_roundtrip() {
        let mut config = PandaConfig::default();
        config.default_solver = IkSolver::Jacobian;
        config.atol = 1e-3;
        config.verbose = true;
        config.jacobian.max_iterations = 80;
        let parsed = PandaConfig::from_yaml_str(&config.to_yaml()).expect("dumped config must parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_override() {
        let yaml = "default_solver: gpu\nmax_steps: 50\njacobian:\n  step_size: 0.3\n";
        let config = PandaConfig::from_yaml_str(yaml).expect("valid yaml");
        assert_eq!(config.default_solver, IkSolver::LevenbergMarquardt);
        assert_eq!(config.max_steps, 50);
        assert_eq!(config.jacobian.step_size, 0.3);
        assert_eq!(config.jacobian.max_iterations, 50);
        assert_eq!(config.atol, 1e-4);
    }

    #[test]
    fn test_unknown_solver_name_keeps_default() {
        let config = PandaConfig::from_yaml_str("default_solver: quantum\n").expect("valid yaml");
        assert_eq!(config.default_solver, IkSolver::PinocchioCpu);
    }

    #[test]
    fn test_degrees_and_cpu_solver_limits() {
        let yaml = "joint_limits:\n  lower: [deg(-90.0), -1.0, -1.0, -3.0, -1.0, 0.0, -1.0]\n";
        let config = PandaConfig::from_yaml_str(yaml).expect("valid yaml");
        assert!((config.joint_limits.lower[0] + std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(config.joint_limits.lower[3], -3.0);
        assert_eq!(config.pinocchio_cpu.limits, config.joint_limits);
    }

    #[test]
    fn test_wrong_length() {
        let yaml = "cartesian_limits:\n  lower: [0.1, -0.4]\n";
        match PandaConfig::from_yaml_str(yaml) {
            Err(PandaError::InvalidLength { expected, found }) => {
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("InvalidLength expected, got {:?}", other),
        }
    }

    #[test]
    fn test_not_a_number() {
        assert!(matches!(
            PandaConfig::from_yaml_str("atol: plenty\n"),
            Err(PandaError::ParseError(_))
        ));
        assert!(matches!(
            PandaConfig::from_yaml_str("max_steps: -3\n"),
            Err(PandaError::ParseError(_))
        ));
        assert!(matches!(
            PandaConfig::from_yaml_str("jacobian:\n  step_size: .nan\n"),
            Err(PandaError::ParseError(_))
        ));
    }

    #[test]
    fn test_blank_solver_name() {
        assert!(matches!(
            PandaConfig::from_yaml_str("default_solver: \"\"\n"),
            Err(PandaError::MissingField(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = PandaConfig::from_yaml_file("src/tests/data/no_such_config.yaml");
        assert!(matches!(result, Err(PandaError::IoError(_))));
    }
}
