//! Built-in stereoscopic formulas
//!
//! Each function here is a pure formula over plain numbers; the
//! [`register_builtin`] wiring binds them to the parameter names of the rig
//! so the store can use them as evaluators. Registry keys are the names of
//! the parameters they compute.

use crate::evaluator::{checked_div, EvaluationError, EvaluatorRegistry, Inputs};
use crate::parameters::value::Value;

/// Reference full-frame (35mm still) sensor size used for crop factors
pub const REF_FRAME_WIDTH_MM: f64 = 36.0;
pub const REF_FRAME_HEIGHT_MM: f64 = 24.0;

/// The four scene planes parallax and real size are computed for
const SCENE_PLANES: [&str; 4] = ["near", "far", "object1", "object2"];

type Formula = fn(&Inputs) -> Result<f64, EvaluationError>;

pub fn diagonal(width: f64, height: f64) -> f64 {
    (width * width + height * height).sqrt()
}

/// Hyperfocal distance `h` in metres and the `h * focus` product
pub fn hyperfocal(
    coc_um: f64,
    focus_distance_m: f64,
    aperture: f64,
    frame_width_px: f64,
    sensor_width_px: f64,
    focal_length_mm: f64,
) -> Result<(f64, f64), EvaluationError> {
    let coc_mm = coc_um / 1000.0;
    let ratio = checked_div(frame_width_px, sensor_width_px)?;
    let h = checked_div(
        0.001 * focal_length_mm * focal_length_mm,
        coc_mm * ratio * aperture,
    )?;
    Ok((h, h * focus_distance_m))
}

/// Near limit of the depth of field
pub fn dof_near(
    coc_um: f64,
    focus_distance_m: f64,
    aperture: f64,
    frame_width_px: f64,
    sensor_width_px: f64,
    focal_length_mm: f64,
) -> Result<f64, EvaluationError> {
    if coc_um == 0.0 {
        return Ok(focus_distance_m);
    }

    let (h, hs) = hyperfocal(
        coc_um,
        focus_distance_m,
        aperture,
        frame_width_px,
        sensor_width_px,
        focal_length_mm,
    )?;

    if focus_distance_m == f64::INFINITY {
        return Ok(h);
    }

    checked_div(hs, h + focus_distance_m)
}

/// Far limit of the depth of field; infinite at or beyond the hyperfocal distance
pub fn dof_far(
    coc_um: f64,
    focus_distance_m: f64,
    aperture: f64,
    frame_width_px: f64,
    sensor_width_px: f64,
    focal_length_mm: f64,
) -> Result<f64, EvaluationError> {
    if coc_um == 0.0 {
        return Ok(focus_distance_m);
    }

    if focus_distance_m == f64::INFINITY {
        return Ok(f64::INFINITY);
    }

    let (h, hs) = hyperfocal(
        coc_um,
        focus_distance_m,
        aperture,
        frame_width_px,
        sensor_width_px,
        focal_length_mm,
    )?;

    if focus_distance_m >= h {
        return Ok(f64::INFINITY);
    }

    checked_div(hs, h - focus_distance_m)
}

/// Angle of view in degrees across `size_mm` of the frame
pub fn fov_deg(focal_length_mm: f64, size_mm: f64) -> Result<f64, EvaluationError> {
    Ok(2.0 * checked_div(size_mm, 2.0 * focal_length_mm)?.atan().to_degrees())
}

pub fn convergence_deg(baseline_mm: f64, distance_screen_m: f64) -> Result<f64, EvaluationError> {
    Ok(2.0 * checked_div(baseline_mm / 2.0, 1000.0 * distance_screen_m)?.atan().to_degrees())
}

pub fn convergence_px(
    frame_width_px: f64,
    baseline_mm: f64,
    distance_screen_m: f64,
    frame_width_mm: f64,
    focal_length_mm: f64,
) -> Result<f64, EvaluationError> {
    let eye = checked_div(baseline_mm, 2.0 * 1000.0 * distance_screen_m)?.atan();
    let frame = checked_div(frame_width_mm, 2.0 * focal_length_mm)?.atan();
    checked_div(frame_width_px * eye, frame)
}

/// Parallax of an object at `distance_m`, in percent of the frame width
pub fn parallax_percent(
    baseline_mm: f64,
    focal_length_mm: f64,
    frame_width_mm: f64,
    distance_screen_m: f64,
    distance_m: f64,
) -> Result<f64, EvaluationError> {
    let scale = checked_div(100.0 * baseline_mm * focal_length_mm, frame_width_mm)?;
    let screen = checked_div(1.0, 1000.0 * distance_screen_m)?;
    let object = checked_div(1.0, 1000.0 * distance_m)?;
    Ok(scale * (screen - object))
}

/// Parallax on a screen of the given width, in mm
pub fn parallax_mm(screen_width_m: f64, parallax_percent: f64) -> f64 {
    10.0 * screen_width_m * parallax_percent
}

/// Real extent covered by an angle of view at `distance_m`
pub fn real_size(fov_deg: f64, distance_m: f64) -> f64 {
    2.0 * distance_m * (fov_deg / 2.0).to_radians().tan()
}

/// Physical size of the used part of the sensor
pub fn frame_size_mm(frame_px: f64, sensor_px: f64, sensor_mm: f64) -> Result<f64, EvaluationError> {
    checked_div(sensor_mm * frame_px, sensor_px)
}

pub fn coc_um(
    coc_px: f64,
    sensor_width_mm: f64,
    sensor_width_px: f64,
    sensor_height_mm: f64,
    sensor_height_px: f64,
) -> Result<f64, EvaluationError> {
    let pitch = checked_div(sensor_width_mm, sensor_width_px)?
        .min(checked_div(sensor_height_mm, sensor_height_px)?);
    Ok(1000.0 * coc_px * pitch)
}

pub fn spectator_fov_deg(screen_width_m: f64, screen_distance_m: f64) -> Result<f64, EvaluationError> {
    Ok(2.0 * checked_div(screen_width_m, 2.0 * screen_distance_m)?.atan().to_degrees())
}

/// Perceived depth of an object relative to the screen distance, in percent
pub fn perceived_position_percent(
    interpupillary_distance_mm: f64,
    parallax_mm: f64,
) -> Result<f64, EvaluationError> {
    checked_div(
        100.0 * interpupillary_distance_mm,
        interpupillary_distance_mm - parallax_mm,
    )
}

pub fn shutter_us(record_framerate: f64, shutter_deg: f64) -> Result<f64, EvaluationError> {
    Ok(checked_div(1_000_000.0, record_framerate)? * shutter_deg / 360.0)
}

const DOF_INPUTS: [&str; 6] = [
    "focus_distance_m",
    "focal_length_mm",
    "aperture",
    "coc_um",
    "frame_width_px",
    "sensor_width_px",
];

fn dof_args(i: &Inputs) -> Result<[f64; 6], EvaluationError> {
    Ok([
        i.number("coc_um")?,
        i.number("focus_distance_m")?,
        i.number("aperture")?,
        i.number("frame_width_px")?,
        i.number("sensor_width_px")?,
        i.number("focal_length_mm")?,
    ])
}

fn register_formula(registry: &mut EvaluatorRegistry, name: &str, requires: &[&str], formula: Formula) {
    registry.register_fn(name, requires, move |inputs| formula(inputs).map(Value::Float));
}

/// Register every built-in formula under the name of the parameter it computes
pub fn register_builtin(registry: &mut EvaluatorRegistry) {
    register_formula(registry, "dof_near_m", &DOF_INPUTS, |i| {
        let [coc, focus, aperture, frame_px, sensor_px, focal] = dof_args(i)?;
        dof_near(coc, focus, aperture, frame_px, sensor_px, focal)
    });
    register_formula(registry, "dof_far_m", &DOF_INPUTS, |i| {
        let [coc, focus, aperture, frame_px, sensor_px, focal] = dof_args(i)?;
        dof_far(coc, focus, aperture, frame_px, sensor_px, focal)
    });
    register_formula(registry, "dof_total_m", &["dof_near_m", "dof_far_m"], |i| {
        Ok(i.number("dof_far_m")? - i.number("dof_near_m")?)
    });

    register_formula(
        registry,
        "fov_horizontal_deg",
        &["focal_length_mm", "frame_width_mm"],
        |i| fov_deg(i.number("focal_length_mm")?, i.number("frame_width_mm")?),
    );
    register_formula(
        registry,
        "fov_vertical_deg",
        &["focal_length_mm", "frame_height_mm"],
        |i| fov_deg(i.number("focal_length_mm")?, i.number("frame_height_mm")?),
    );
    register_formula(
        registry,
        "fov_diagonal_deg",
        &["focal_length_mm", "frame_height_mm", "frame_width_mm"],
        |i| {
            let diag = diagonal(i.number("frame_width_mm")?, i.number("frame_height_mm")?);
            fov_deg(i.number("focal_length_mm")?, diag)
        },
    );

    register_formula(
        registry,
        "convergence_deg",
        &["baseline_mm", "distance_screen_m"],
        |i| convergence_deg(i.number("baseline_mm")?, i.number("distance_screen_m")?),
    );
    register_formula(
        registry,
        "convergence_px",
        &[
            "frame_width_px",
            "baseline_mm",
            "distance_screen_m",
            "frame_width_mm",
            "focal_length_mm",
        ],
        |i| {
            convergence_px(
                i.number("frame_width_px")?,
                i.number("baseline_mm")?,
                i.number("distance_screen_m")?,
                i.number("frame_width_mm")?,
                i.number("focal_length_mm")?,
            )
        },
    );

    for plane in SCENE_PLANES {
        let distance = format!("distance_{}_m", plane);
        let percent = format!("parallax_{}_percent", plane);
        let mm = format!("parallax_{}_mm", plane);

        let key = distance.clone();
        registry.register_fn(
            &percent,
            &[
                "baseline_mm",
                "focal_length_mm",
                "frame_width_mm",
                "distance_screen_m",
                distance.as_str(),
            ],
            move |i| {
                parallax_percent(
                    i.number("baseline_mm")?,
                    i.number("focal_length_mm")?,
                    i.number("frame_width_mm")?,
                    i.number("distance_screen_m")?,
                    i.number(&key)?,
                )
                .map(Value::Float)
            },
        );

        let key = percent.clone();
        registry.register_fn(&mm, &["screen_width_m", percent.as_str()], move |i| {
            Ok(Value::Float(parallax_mm(i.number("screen_width_m")?, i.number(&key)?)))
        });
    }

    for plane in ["near", "screen", "far", "object1", "object2"] {
        let distance = format!("distance_{}_m", plane);
        for (axis, fov) in [("width", "fov_horizontal_deg"), ("height", "fov_vertical_deg")] {
            let key = distance.clone();
            registry.register_fn(
                &format!("real_{}_{}_m", axis, plane),
                &[fov, distance.as_str()],
                move |i| Ok(Value::Float(real_size(i.number(fov)?, i.number(&key)?))),
            );
        }

        let parallax = format!("parallax_{}_mm", plane);
        let percent = format!("perceived_position_{}_percent", plane);
        let key = parallax.clone();
        registry.register_fn(
            &percent,
            &["interpupillary_distance_mm", parallax.as_str()],
            move |i| {
                perceived_position_percent(i.number("interpupillary_distance_mm")?, i.number(&key)?)
                    .map(Value::Float)
            },
        );

        let key = percent.clone();
        registry.register_fn(
            &format!("perceived_position_{}_m", plane),
            &["screen_distance_m", percent.as_str()],
            move |i| Ok(Value::Float(i.number("screen_distance_m")? * i.number(&key)? / 100.0)),
        );
    }

    register_formula(
        registry,
        "frame_width_mm",
        &["frame_width_px", "sensor_width_px", "sensor_width_mm"],
        |i| {
            frame_size_mm(
                i.number("frame_width_px")?,
                i.number("sensor_width_px")?,
                i.number("sensor_width_mm")?,
            )
        },
    );
    register_formula(
        registry,
        "frame_height_mm",
        &["frame_height_px", "sensor_height_px", "sensor_height_mm"],
        |i| {
            frame_size_mm(
                i.number("frame_height_px")?,
                i.number("sensor_height_px")?,
                i.number("sensor_height_mm")?,
            )
        },
    );
    register_formula(
        registry,
        "frame_diagonal_mm",
        &["frame_width_mm", "frame_height_mm"],
        |i| Ok(diagonal(i.number("frame_width_mm")?, i.number("frame_height_mm")?)),
    );
    register_formula(registry, "frame_horizontal_crop", &["frame_width_mm"], |i| {
        checked_div(REF_FRAME_WIDTH_MM, i.number("frame_width_mm")?)
    });
    register_formula(registry, "frame_vertical_crop", &["frame_height_mm"], |i| {
        checked_div(REF_FRAME_HEIGHT_MM, i.number("frame_height_mm")?)
    });
    register_formula(
        registry,
        "frame_diagonal_crop",
        &["frame_width_mm", "frame_height_mm"],
        |i| {
            checked_div(
                diagonal(REF_FRAME_WIDTH_MM, REF_FRAME_HEIGHT_MM),
                diagonal(i.number("frame_width_mm")?, i.number("frame_height_mm")?),
            )
        },
    );

    register_formula(
        registry,
        "coc_um",
        &[
            "coc_px",
            "sensor_width_mm",
            "sensor_width_px",
            "sensor_height_mm",
            "sensor_height_px",
        ],
        |i| {
            coc_um(
                i.number("coc_px")?,
                i.number("sensor_width_mm")?,
                i.number("sensor_width_px")?,
                i.number("sensor_height_mm")?,
                i.number("sensor_height_px")?,
            )
        },
    );

    register_formula(
        registry,
        "screen_distance_m",
        &["screen_width_m", "screen_distance_n"],
        |i| Ok(i.number("screen_distance_n")? * i.number("screen_width_m")?),
    );
    register_formula(
        registry,
        "spectator_fov_horizontal_deg",
        &["screen_width_m", "screen_distance_m"],
        |i| spectator_fov_deg(i.number("screen_width_m")?, i.number("screen_distance_m")?),
    );
    register_formula(
        registry,
        "shutter_us",
        &["record_framerate", "shutter_deg"],
        |i| shutter_us(i.number("record_framerate")?, i.number("shutter_deg")?),
    );
}
