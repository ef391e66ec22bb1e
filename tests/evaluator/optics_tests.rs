//! Tests for the built-in stereoscopic evaluators, looked up by name

use approx::assert_relative_eq;
use rigparams_rs::evaluator::{EvaluationError, Evaluator, EvaluatorRegistry, Inputs};

fn evaluate(name: &str, inputs: &Inputs) -> Result<f64, EvaluationError> {
    let registry = EvaluatorRegistry::with_builtin();
    let evaluator = registry
        .get(name)
        .unwrap_or_else(|| panic!("no evaluator for {}", name));
    Ok(evaluator.evaluate(inputs)?.as_f64().unwrap())
}

fn lens() -> Inputs {
    Inputs::new()
        .with("focal_length_mm", 20.0)
        .with("frame_width_mm", 15.84)
        .with("frame_height_mm", 8.91)
        .with("baseline_mm", 50.0)
        .with("distance_screen_m", 3.15)
}

#[test]
fn test_every_derived_name_registered() {
    let registry = EvaluatorRegistry::with_builtin();
    for name in [
        "shutter_us",
        "dof_near_m",
        "dof_far_m",
        "dof_total_m",
        "fov_horizontal_deg",
        "fov_vertical_deg",
        "fov_diagonal_deg",
        "convergence_deg",
        "convergence_px",
        "parallax_near_percent",
        "parallax_object2_mm",
        "real_width_screen_m",
        "real_height_far_m",
        "frame_width_mm",
        "frame_diagonal_mm",
        "frame_diagonal_crop",
        "coc_um",
        "screen_distance_m",
        "spectator_fov_horizontal_deg",
        "perceived_position_near_percent",
        "perceived_position_object1_m",
    ] {
        assert!(registry.contains(name), "missing {}", name);
    }
    assert!(!registry.contains("parallax_screen_percent"));
}

#[test]
fn test_field_of_view() {
    assert_relative_eq!(
        evaluate("fov_horizontal_deg", &lens()).unwrap(),
        43.2071,
        epsilon = 1e-4
    );
    assert_relative_eq!(
        evaluate("fov_vertical_deg", &lens()).unwrap(),
        25.1152,
        epsilon = 1e-4
    );
    assert_relative_eq!(
        evaluate("fov_diagonal_deg", &lens()).unwrap(),
        48.8693,
        epsilon = 1e-4
    );
}

#[test]
fn test_parallax() {
    let near = lens().with("distance_near_m", 1.04);
    assert_relative_eq!(
        evaluate("parallax_near_percent", &near).unwrap(),
        -4.0661,
        epsilon = 1e-4
    );

    // an object at infinity sits at the maximum positive parallax
    let far = lens().with("distance_far_m", f64::INFINITY);
    assert_relative_eq!(
        evaluate("parallax_far_percent", &far).unwrap(),
        2.0042,
        epsilon = 1e-4
    );

    let at_zero = lens().with("distance_object1_m", 0.0);
    assert!(evaluate("parallax_object1_percent", &at_zero)
        .unwrap_err()
        .is_arithmetic());

    let on_screen = Inputs::new()
        .with("screen_width_m", 1.08)
        .with("parallax_near_percent", -4.066149899483234);
    assert_relative_eq!(
        evaluate("parallax_near_mm", &on_screen).unwrap(),
        -43.9144,
        epsilon = 1e-4
    );
}

#[test]
fn test_perceived_position() {
    let inputs = Inputs::new()
        .with("interpupillary_distance_mm", 65.0)
        .with("parallax_near_mm", -43.91441891441893);
    assert_relative_eq!(
        evaluate("perceived_position_near_percent", &inputs).unwrap(),
        59.6799,
        epsilon = 1e-4
    );

    // parallax equal to the eye distance puts the object at infinity
    let diverging = Inputs::new()
        .with("interpupillary_distance_mm", 65.0)
        .with("parallax_far_mm", 65.0);
    assert!(evaluate("perceived_position_far_percent", &diverging)
        .unwrap_err()
        .is_arithmetic());

    let metres = Inputs::new()
        .with("screen_distance_m", 2.16)
        .with("perceived_position_object1_percent", 50.0);
    assert_relative_eq!(
        evaluate("perceived_position_object1_m", &metres).unwrap(),
        1.08,
        epsilon = 1e-12
    );
}

#[test]
fn test_real_size() {
    let inputs = Inputs::new()
        .with("fov_horizontal_deg", 43.20713146032039)
        .with("distance_near_m", 1.04);
    assert_relative_eq!(
        evaluate("real_width_near_m", &inputs).unwrap(),
        0.82368,
        epsilon = 1e-5
    );
}

#[test]
fn test_frame_geometry() {
    let inputs = Inputs::new()
        .with("frame_width_px", 4096)
        .with("sensor_width_px", 5120)
        .with("sensor_width_mm", 27.7);
    assert_relative_eq!(evaluate("frame_width_mm", &inputs).unwrap(), 22.16, epsilon = 1e-9);

    let crop = Inputs::new().with("frame_width_mm", 22.16);
    assert_relative_eq!(
        evaluate("frame_horizontal_crop", &crop).unwrap(),
        1.6245,
        epsilon = 1e-4
    );

    let unset = Inputs::new().with("frame_width_mm", 0.0);
    assert!(evaluate("frame_horizontal_crop", &unset)
        .unwrap_err()
        .is_arithmetic());
}

#[test]
fn test_depth_of_field() {
    let inputs = Inputs::new()
        .with("coc_um", 10.814814814814815)
        .with("focus_distance_m", 5.0)
        .with("aperture", 2.0)
        .with("frame_width_px", 4096)
        .with("sensor_width_px", 5120)
        .with("focal_length_mm", 35.0);

    let near = evaluate("dof_near_m", &inputs).unwrap();
    let far = evaluate("dof_far_m", &inputs).unwrap();
    assert_relative_eq!(near, 4.6702, epsilon = 1e-4);
    assert_relative_eq!(far, 5.3800, epsilon = 1e-4);

    let total = Inputs::new().with("dof_near_m", near).with("dof_far_m", far);
    assert_relative_eq!(evaluate("dof_total_m", &total).unwrap(), 0.7098, epsilon = 1e-4);

    // beyond the hyperfocal distance everything to infinity is sharp
    let distant = inputs.clone().with("focus_distance_m", 100.0);
    assert_eq!(evaluate("dof_far_m", &distant).unwrap(), f64::INFINITY);
}

#[test]
fn test_shutter() {
    let inputs = Inputs::new()
        .with("record_framerate", 25.0)
        .with("shutter_deg", 180.0);
    assert_relative_eq!(evaluate("shutter_us", &inputs).unwrap(), 20000.0);

    let stopped = inputs.with("record_framerate", 0.0);
    assert!(evaluate("shutter_us", &stopped).unwrap_err().is_arithmetic());
}

#[test]
fn test_spectator_view() {
    let distance = Inputs::new()
        .with("screen_width_m", 1.08)
        .with("screen_distance_n", 2.0);
    assert_relative_eq!(evaluate("screen_distance_m", &distance).unwrap(), 2.16);

    let fov = Inputs::new()
        .with("screen_width_m", 1.08)
        .with("screen_distance_m", 2.16);
    assert_relative_eq!(
        evaluate("spectator_fov_horizontal_deg", &fov).unwrap(),
        28.0725,
        epsilon = 1e-4
    );
}
