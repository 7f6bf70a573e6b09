//! The `scale` command: one job, in process, with engine exit codes.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use body_jobs::status::{EXIT_ASSET_IO, EXIT_FAILURE, EXIT_GEOMETRY, EXIT_USAGE};
use body_scale::{OutputMesh, ScaleError, ScaleParams, scale_file};
use owo_colors::OwoColorize;

pub fn run(
    base: &Path,
    output: &Path,
    height: f64,
    weight: f64,
    texture: Option<PathBuf>,
    json: bool,
) -> ExitCode {
    let mut params = ScaleParams::new(height, weight);
    if let Some(texture) = texture {
        params = params.with_texture(texture);
    }

    match scale_file(base, output, &params) {
        Ok(out) => {
            if json {
                match serde_json::to_string_pretty(&out) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        eprintln!("{} {e}", "✗".red().bold());
                        return ExitCode::from(exit_byte(EXIT_FAILURE));
                    }
                }
            } else {
                print_report(&out);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {e}", "✗".red().bold());
            ExitCode::from(exit_byte(exit_code(&e)))
        }
    }
}

/// Exit code reported for a failed job.
pub fn exit_code(error: &ScaleError) -> i32 {
    match error {
        ScaleError::InvalidMeasurement { .. } => EXIT_USAGE,
        ScaleError::Geometry { .. } => EXIT_GEOMETRY,
        ScaleError::Io(_) => EXIT_ASSET_IO,
        _ => EXIT_FAILURE,
    }
}

pub fn exit_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}

fn print_report(out: &OutputMesh) {
    let report = &out.report;
    println!("{} {}", "✓".green(), out.path.display().bold());
    println!(
        "  height ratio {:.3}  bmi {:.2} (reference {:.2})  bmi scale {:.3}",
        report.factors.height_ratio,
        report.factors.bmi,
        report.factors.reference_bmi,
        report.factors.bmi_scale
    );
    println!(
        "  {} meshes, {} vertices, {} joints scaled",
        report.meshes,
        report.vertices,
        report.joints_scaled.len()
    );
    if !report.joints_skipped.is_empty() {
        println!(
            "  {} {}",
            "skipped:".yellow(),
            report.joints_skipped.join(", ")
        );
    }
    if report.texture_substituted() {
        println!("  texture replaced on {} textures", report.textures_replaced);
    }
}
