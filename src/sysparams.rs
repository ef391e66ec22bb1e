//! Static parameter set of the stereoscopic rig
//!
//! Derived parameters are bound to the evaluator registered under their own
//! name, so [`system_parameters`] needs a registry holding the built-in
//! formulas (see [`EvaluatorRegistry::with_builtin`]).

use crate::evaluator::EvaluatorRegistry;
use crate::parameters::{Parameter, ParameterStatus, Value, ValueType};
use crate::store::ConfigurationError;

/// Parameters driven by the lens and rig servos
pub const SERVO_PARAMETERS: &[&str] = &["baseline_mm", "focus_distance_m", "focal_length_mm", "aperture"];

/// Parameters owned by the camera
pub const CAMERA_PARAMETERS: &[&str] = &[
    "iso",
    "camera_type",
    "record_framerate",
    "shutter_us",
    "shutter_deg",
    "scene_no",
    "shot_no",
    "take_no",
    "start_absolute_timecode",
    "project_framerate",
    "director",
    "director_of_photography",
    "copyright",
    "camera_id",
    "clip_id",
    "reel_id",
    "camera_operator",
    "location",
    "frame_width_px",
    "frame_height_px",
    "frame_format",
    "production_name",
    "record_date",
    "record_time",
    "sensor_width_mm",
    "sensor_height_mm",
    "sensor_width_px",
    "sensor_height_px",
];

pub fn is_servo_parameter(name: &str) -> bool {
    SERVO_PARAMETERS.contains(&name)
}

pub fn is_camera_parameter(name: &str) -> bool {
    CAMERA_PARAMETERS.contains(&name)
}

fn text(name: &str, default: &str) -> Parameter {
    Parameter::new(name, default, ValueType::Str)
}

fn float(name: &str, default: f64) -> Parameter {
    Parameter::new(name, default, ValueType::Float)
}

fn int(name: &str, default: i64) -> Parameter {
    Parameter::new(name, default, ValueType::Int)
}

fn flag(name: &str, default: bool) -> Parameter {
    Parameter::new(name, default, ValueType::Bool)
}

fn fixed(name: &str, default: impl Into<Value>, value_type: ValueType) -> Parameter {
    Parameter::read_only(name, default, value_type)
}

/// A float parameter computed by the evaluator registered under `name`
fn derived(registry: &EvaluatorRegistry, name: &str, default: f64) -> Result<Parameter, ConfigurationError> {
    let evaluator = registry
        .get(name)
        .ok_or_else(|| ConfigurationError::UnknownEvaluator {
            parameter: name.to_string(),
            evaluator: name.to_string(),
        })?;
    Ok(float(name, default).with_evaluator(evaluator))
}

/// Like [`derived`], flagged read-only
fn derived_fixed(
    registry: &EvaluatorRegistry,
    name: &str,
    default: f64,
) -> Result<Parameter, ConfigurationError> {
    Ok(derived(registry, name, default)?.with_status(ParameterStatus::read_only()))
}

/// The full rig definition list, in load order
pub fn system_parameters(registry: &EvaluatorRegistry) -> Result<Vec<Parameter>, ConfigurationError> {
    let r = registry;

    Ok(vec![
        // shot
        text("scene_no", ""),
        text("scene_name", ""),
        text("shot_no", ""),
        text("location", ""),
        text("notes", ""),
        // clip
        fixed("camera_id", "A", ValueType::Str),
        float("record_framerate", 25.0),
        float("shutter_deg", 180.0),
        derived_fixed(r, "shutter_us", 20000.0)?,
        int("iso", 800),
        text("filters", ""),
        fixed("reel_id", "001", ValueType::Str),
        fixed("clip_id", "001", ValueType::Str),
        text("take_no", "3"),
        fixed("record_date", "", ValueType::Str),
        fixed("record_time", "", ValueType::Str),
        fixed("start_absolute_timecode", "", ValueType::Str),
        int("frames", 0),
        int("rating", 0),
        flag("circle", false),
        text("script_notes", ""),
        text("camera_notes", ""),
        text("edit_notes", ""),
        text("post_notes", ""),
        // lens & rig
        fixed("lens_description", "", ValueType::Str),
        fixed("focal_length_mm", 35.0, ValueType::Float),
        fixed("aperture", 2.0, ValueType::Float),
        fixed("aperture_text", "2.0", ValueType::Str),
        fixed("focus_distance_m", 5.0, ValueType::Float),
        derived(r, "dof_near_m", 0.0)?,
        derived(r, "dof_far_m", 0.0)?,
        derived(r, "dof_total_m", 0.0)?,
        derived(r, "fov_horizontal_deg", 0.0)?,
        derived(r, "fov_vertical_deg", 0.0)?,
        derived(r, "fov_diagonal_deg", 0.0)?,
        float("baseline_mm", 80.0),
        derived(r, "convergence_deg", 0.0)?,
        derived(r, "convergence_px", 0.0)?,
        // scene
        float("distance_near_m", 2.0),
        float("distance_screen_m", 2.0),
        float("distance_far_m", 6.0),
        float("distance_object1_m", 0.0),
        float("distance_object2_m", 0.0),
        text("description_near", ""),
        text("description_screen", ""),
        text("description_far", ""),
        text("description_object1", ""),
        text("description_object2", ""),
        derived(r, "parallax_near_percent", 0.0)?,
        float("parallax_screen_percent", 0.0),
        derived(r, "parallax_far_percent", 0.0)?,
        derived(r, "parallax_object1_percent", 0.0)?,
        derived(r, "parallax_object2_percent", 0.0)?,
        derived(r, "parallax_near_mm", 0.0)?,
        float("parallax_screen_mm", 0.0),
        derived(r, "parallax_far_mm", 0.0)?,
        derived(r, "parallax_object1_mm", 0.0)?,
        derived(r, "parallax_object2_mm", 0.0)?,
        derived(r, "real_width_near_m", 0.0)?,
        derived(r, "real_height_near_m", 0.0)?,
        derived(r, "real_width_screen_m", 0.0)?,
        derived(r, "real_height_screen_m", 0.0)?,
        derived(r, "real_width_far_m", 0.0)?,
        derived(r, "real_height_far_m", 0.0)?,
        derived(r, "real_width_object1_m", 0.0)?,
        derived(r, "real_height_object1_m", 0.0)?,
        derived(r, "real_width_object2_m", 0.0)?,
        derived(r, "real_height_object2_m", 0.0)?,
        // camera
        fixed("stereoscopic_set", true, ValueType::Bool),
        fixed("stereo_setup", "C", ValueType::Str),
        fixed("camera_type", "RED Mysterium-X", ValueType::Str),
        fixed("sensor_width_mm", 27.7, ValueType::Float),
        fixed("sensor_width_px", 5120, ValueType::Int),
        fixed("sensor_height_mm", 14.6, ValueType::Float),
        fixed("sensor_height_px", 2700, ValueType::Int),
        text("frame_format", "4K"),
        derived_fixed(r, "frame_width_mm", 0.0)?,
        fixed("frame_width_px", 4096, ValueType::Int),
        derived_fixed(r, "frame_height_mm", 0.0)?,
        fixed("frame_height_px", 2160, ValueType::Int),
        derived_fixed(r, "frame_diagonal_mm", 0.0)?,
        derived_fixed(r, "frame_horizontal_crop", 0.0)?,
        derived_fixed(r, "frame_vertical_crop", 0.0)?,
        derived_fixed(r, "frame_diagonal_crop", 0.0)?,
        float("coc_px", 2.0),
        derived(r, "coc_um", 0.0)?,
        fixed("record_state", 0, ValueType::Int),
        // integration
        text("rig_controller_url", ""),
        fixed("aladin_module_enable", false, ValueType::Bool),
        fixed("aladin_module_status", false, ValueType::Bool),
        fixed("aladin_f_mode", 2, ValueType::Int),
        fixed("aladin_i_mode", 2, ValueType::Int),
        fixed("aladin_z_mode", 2, ValueType::Int),
        fixed("aladin_c_mode", 2, ValueType::Int),
        fixed("aladin_ia_mode", 1, ValueType::Int),
        fixed("red_module_enable", true, ValueType::Bool),
        fixed("red_module_status", false, ValueType::Bool),
        fixed("phantom_module_enable", false, ValueType::Bool),
        fixed("camera_center_hostname", "100.10.10.101", ValueType::Str),
        fixed("camera_left_hostname", "100.10.10.101", ValueType::Str),
        fixed("camera_right_hostname", "100.10.10.102", ValueType::Str),
        // screen
        text("screen_type", "TV 50-inch"),
        float("screen_width_m", 1.08),
        float("screen_height_m", 0.67),
        float("screen_distance_n", 2.0),
        derived(r, "screen_distance_m", 0.0)?,
        float("interpupillary_distance_mm", 65.0),
        derived(r, "spectator_fov_horizontal_deg", 0.0)?,
        derived(r, "perceived_position_near_percent", 0.0)?,
        derived(r, "perceived_position_screen_percent", 0.0)?,
        derived(r, "perceived_position_far_percent", 0.0)?,
        derived(r, "perceived_position_object1_percent", 0.0)?,
        derived(r, "perceived_position_object2_percent", 0.0)?,
        derived(r, "perceived_position_near_m", 0.0)?,
        derived(r, "perceived_position_screen_m", 0.0)?,
        derived(r, "perceived_position_far_m", 0.0)?,
        derived(r, "perceived_position_object1_m", 0.0)?,
        derived(r, "perceived_position_object2_m", 0.0)?,
        // project
        text("production_name", ""),
        text("director", ""),
        text("director_of_photography", ""),
        text("camera_operator", ""),
        text("stereographer", ""),
        fixed("copyright", "", ValueType::Str),
        fixed("project_framerate", 25.0, ValueType::Float),
    ])
}
