use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use crate::utils::utils_console::{cio_print, CioDebug, PrintColor, PrintMode};
use crate::utils::utils_errors::CioError;

/// Configuration of an evaluation run.  Loadable from RON, JSON, or TOML through the string
/// conversion traits in `utils_traits`.
///
/// ## Example
/// ```
/// use cio_planner::utils::utils_parameters::EvaluationParameters;
/// use cio_planner::utils::utils_traits::ToAndFromRonString;
/// let p = EvaluationParameters::load_from_ron_string("(trajectory_duration: 2.0, trajectory_discretization: 0.1, keyframe_interval: 5)").unwrap();
/// assert_eq!(p.num_points(), 21);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationParameters {
    pub trajectory_duration: f64,
    pub trajectory_discretization: f64,
    pub keyframe_interval: usize,
    pub fix_start_point: bool,
    pub fix_goal_point: bool,
    pub optimize_keyframe_velocities: bool,
    pub derivative_epsilon: f64,
    pub friction_coefficient: f64,
    pub gravity: f64,
    pub contact_activation_threshold: f64,
    /// Keyed by cost function name.  A weight of zero deactivates the function.
    pub cost_weights: BTreeMap<String, f64>,
    pub debug: bool
}
impl EvaluationParameters {
    /// Number of discretized points covering `[0, trajectory_duration]`.
    pub fn num_points(&self) -> usize {
        if self.trajectory_discretization <= 0.0 { return 1; }
        return (self.trajectory_duration / self.trajectory_discretization).round() as usize + 1;
    }
    pub fn cost_weight(&self, name: &str) -> f64 {
        return *self.cost_weights.get(name).unwrap_or(&0.0);
    }
    pub fn set_cost_weight(&mut self, name: &str, weight: f64) {
        self.cost_weights.insert(name.to_string(), weight);
    }
    pub fn debug_mode(&self) -> CioDebug {
        CioDebug::new(self.debug)
    }
    pub fn validate(&self) -> Result<(), CioError> {
        if self.keyframe_interval == 0 {
            return Err(CioError::new_generic_error_str("keyframe_interval must be at least 1", file!(), line!()));
        }
        if self.trajectory_duration < 0.0 || self.trajectory_discretization < 0.0 {
            return Err(CioError::new_generic_error_str("trajectory duration and discretization must be non-negative", file!(), line!()));
        }
        let n = self.num_points();
        if (n - 1) % self.keyframe_interval != 0 {
            return Err(CioError::new_generic_error_str(&format!("number of points minus one ({}) is not a multiple of keyframe_interval ({})", n - 1, self.keyframe_interval), file!(), line!()));
        }
        if !(self.derivative_epsilon > 0.0) {
            return Err(CioError::new_generic_error_str("derivative_epsilon must be positive", file!(), line!()));
        }
        if self.friction_coefficient < 0.0 {
            return Err(CioError::new_generic_error_str("friction_coefficient must be non-negative", file!(), line!()));
        }
        Ok(())
    }
    pub fn print_summary(&self) {
        cio_print("Evaluation parameters", PrintMode::Println, PrintColor::Blue, true);
        cio_print(&format!("  points: {}, keyframe interval: {}, discretization: {}", self.num_points(), self.keyframe_interval, self.trajectory_discretization), PrintMode::Println, PrintColor::None, false);
        cio_print(&format!("  fix start: {}, fix goal: {}, optimize velocities: {}", self.fix_start_point, self.fix_goal_point, self.optimize_keyframe_velocities), PrintMode::Println, PrintColor::None, false);
        for (name, weight) in &self.cost_weights {
            let color = if *weight == 0.0 { PrintColor::Yellow } else { PrintColor::None };
            cio_print(&format!("  {}: {}", name, weight), PrintMode::Println, color, false);
        }
    }
}
impl Default for EvaluationParameters {
    fn default() -> Self {
        Self {
            trajectory_duration: 1.0,
            trajectory_discretization: 0.05,
            keyframe_interval: 5,
            fix_start_point: true,
            fix_goal_point: true,
            optimize_keyframe_velocities: false,
            derivative_epsilon: 1e-6,
            friction_coefficient: 0.7,
            gravity: 9.81,
            contact_activation_threshold: 1e-6,
            cost_weights: BTreeMap::new(),
            debug: false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::utils_traits::{ToAndFromJsonString, ToAndFromRonString, ToAndFromTomlString};

    #[test]
    fn default_parameters_validate() {
        let p = EvaluationParameters::default();
        assert_eq!(p.num_points(), 21);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn bad_keyframe_interval_is_rejected() {
        let mut p = EvaluationParameters::default();
        p.keyframe_interval = 3;
        assert!(matches!(p.validate(), Err(CioError::GenericError(_))));
    }

    #[test]
    fn loads_from_each_format() {
        let mut p = EvaluationParameters::default();
        p.set_cost_weight("smoothness", 0.5);

        let ron = p.convert_to_ron_string();
        assert_eq!(EvaluationParameters::load_from_ron_string(&ron).expect("ron"), p);

        let json = p.convert_to_json_string();
        assert_eq!(EvaluationParameters::load_from_json_string(&json).expect("json"), p);

        let toml_str = "keyframe_interval = 4\ntrajectory_duration = 0.8\ntrajectory_discretization = 0.1\n[cost_weights]\ntorque = 0.01\n";
        let from_toml = EvaluationParameters::load_from_toml_string(toml_str).expect("toml");
        assert_eq!(from_toml.num_points(), 9);
        assert_eq!(from_toml.cost_weight("torque"), 0.01);
        assert_eq!(from_toml.cost_weight("smoothness"), 0.0);
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        let r = EvaluationParameters::load_from_json_string("{ not json");
        assert!(matches!(r, Err(CioError::ParseError(_))));
    }
}
