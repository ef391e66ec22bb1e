//! Example of driving a stereoscopic rig through the controller.
//!
//! This example loads the rig definition (plus any derived expressions from
//! an optional TOML file given as the first argument), changes a few lens and
//! scene settings, prints the recomputed stereo values and takes a snapshot.
//!
//! Run with `RUST_LOG=debug` to watch the cascades.

use rigparams_rs::codec::ParameterCodec;
use rigparams_rs::config::{ControllerConfig, DerivedDefinition};
use rigparams_rs::evaluator::EvaluatorRegistry;
use rigparams_rs::parameters::{Parameter, ValueType};
use rigparams_rs::store::Listener;
use rigparams_rs::Controller;
use std::sync::Arc;

fn print_values(controller: &Controller, names: &[&str]) {
    let params = controller.get_parameters();
    for name in names {
        if let Some(param) = params.get(*name) {
            println!("  {:<34} {}", name, param.value());
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Stereoscopic rig example");
    println!("========================\n");

    let mut config = match std::env::args().nth(1) {
        Some(path) => ControllerConfig::load_or_default(path),
        None => ControllerConfig::default(),
    };
    config.snapshots_location = std::env::temp_dir().join("rigparams-demo-snapshots");
    config.derived.push(DerivedDefinition {
        name: "stereo_ratio".to_string(),
        expression: "baseline_mm / interpupillary_distance_mm".to_string(),
        value_type: ValueType::Float,
        read_only: true,
        min: Some(0.0),
        max: None,
    });

    let controller = Controller::from_config(&config, &EvaluatorRegistry::with_builtin())?;
    println!("Loaded {} parameters\n", controller.store().len());

    let listener: Listener = Arc::new(|param: &Parameter| {
        println!("  -> {} changed to {}", param.name(), param.value());
        Ok(())
    });
    controller.store().listeners().add(listener);

    // 1. Camera format; read-only on the client side, so written on the store
    println!("1. Camera format");
    println!("----------------");
    let store = controller.store();
    store.set("frame_width_px", 4096)?;
    store.set("frame_height_px", 2160)?;
    print_values(
        &controller,
        &["frame_width_mm", "frame_height_mm", "frame_horizontal_crop"],
    );

    // 2. Lens and rig, as a client would send them
    println!("\n2. Lens and rig");
    println!("---------------");
    let request = r#"{
        "baseline_mm": { "value": 50.0, "type": "float" },
        "coc_px": { "value": 2, "type": "float" },
        "focal_length_mm": { "value": 20.0, "type": "float" }
    }"#;
    let applied = controller.apply_parameters(ParameterCodec::new().decode(request)?)?;
    println!("  applied {} parameters (focal length is read-only)", applied.len());

    store.set("focal_length_mm", 20.0)?;
    print_values(
        &controller,
        &[
            "fov_horizontal_deg",
            "fov_vertical_deg",
            "coc_um",
            "dof_near_m",
            "dof_far_m",
            "stereo_ratio",
        ],
    );

    // 3. Scene planes
    println!("\n3. Scene");
    println!("--------");
    controller.set_parameter("screen_distance_n", 2.0)?;
    controller.set_parameter("distance_screen_m", 3.15)?;
    controller.set_parameter("distance_near_m", 1.04)?;
    print_values(
        &controller,
        &[
            "convergence_deg",
            "convergence_px",
            "parallax_near_percent",
            "parallax_near_mm",
            "real_width_near_m",
            "perceived_position_near_percent",
            "perceived_position_near_m",
        ],
    );

    // 4. Snapshots
    println!("\n4. Snapshots");
    println!("------------");
    store.listeners().clear();
    let id = controller.take_snapshot()?;
    controller.set_parameter("baseline_mm", 80.0)?;
    let restored = controller.restore_snapshot(id)?;
    println!(
        "  snapshot {} restored {} parameters, baseline back to {}",
        id,
        restored.len(),
        store.get_value("baseline_mm")?
    );
    controller.delete_snapshot(id)?;

    Ok(())
}
