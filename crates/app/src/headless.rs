use std::path::{Path, PathBuf};
use std::process;

use dnorm_core::{
    AttributeKey, EditOptions, EditorSettings, Masking, Mesh, TransferMethod, TransferOptions,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct HeadlessPlan {
    #[serde(default)]
    mesh: Option<PathBuf>,
    #[serde(default)]
    save: Option<PathBuf>,
    #[serde(default)]
    settings: EditorSettings,
    #[serde(default)]
    steps: Vec<PlanStep>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum PlanStep {
    AddMissingAttributes,
    DeleteAllAttributes,
    SetCurrentFromOriginal {
        #[serde(default)]
        masking: Option<Masking>,
    },
    CaptureOriginal {
        #[serde(default)]
        masking: Option<Masking>,
    },
    AddDeltaToCurrent {
        shape_key: String,
        #[serde(default)]
        masking: Option<Masking>,
    },
    SetCurrentFromOriginalPlusDelta {
        shape_key: String,
        #[serde(default)]
        masking: Option<Masking>,
    },
    CaptureDelta {
        shape_key: String,
        #[serde(default)]
        masking: Option<Masking>,
    },
    RetargetDelta {
        shape_key: String,
        #[serde(default)]
        masking: Option<Masking>,
    },
    ClearDelta {
        shape_key: String,
        #[serde(default)]
        masking: Option<Masking>,
    },
    SwitchDomain {
        attribute: String,
    },
    RegenerateColours,
    Transfer {
        source: PathBuf,
        method: TransferMethod,
        attribute: String,
        #[serde(default)]
        dest_attribute: Option<String>,
        #[serde(default)]
        masking: Option<Masking>,
    },
}

#[derive(Debug, Default, PartialEq)]
struct HeadlessArgs {
    plan_path: Option<PathBuf>,
    mesh_path: Option<PathBuf>,
    save_path: Option<PathBuf>,
    print: bool,
}

pub fn run(args: &[String]) -> Result<(), String> {
    let parsed = parse_headless_args(args)?;
    let mut plan = match &parsed.plan_path {
        Some(path) => load_headless_plan(path)?,
        None => default_headless_plan(),
    };
    plan.settings.migrate_to_latest();

    let mesh_path = parsed.mesh_path.or_else(|| plan.mesh.clone());
    let mesh = match &mesh_path {
        Some(path) => load_mesh_json(path)?,
        None => default_mesh(),
    };
    tracing::info!(
        "headless: {} vertices, {} corners, {} steps",
        mesh.vertex_count(),
        mesh.corner_count(),
        plan.steps.len()
    );

    let mesh = run_plan(&plan, mesh)?;

    if let Some(path) = parsed.save_path.or_else(|| plan.save.clone()) {
        save_mesh_json(&mesh, &path)?;
        tracing::info!("headless: saved mesh to {:?}", path);
    }

    if parsed.print {
        let json = serde_json::to_string_pretty(&mesh).map_err(|err| err.to_string())?;
        println!("{json}");
    }

    tracing::info!("headless: completed");
    Ok(())
}

fn parse_headless_args(args: &[String]) -> Result<HeadlessArgs, String> {
    let mut parsed = HeadlessArgs::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--plan" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--plan requires a path".to_string())?;
                parsed.plan_path = Some(PathBuf::from(value));
            }
            "--mesh" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--mesh requires a path".to_string())?;
                parsed.mesh_path = Some(PathBuf::from(value));
            }
            "--save" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--save requires a path".to_string())?;
                parsed.save_path = Some(PathBuf::from(value));
            }
            "--print" => {
                parsed.print = true;
            }
            "--verbose" | "-v" => {}
            "--help" | "-h" => {
                print_headless_help();
                process::exit(0);
            }
            other => return Err(format!("unknown argument {other}")),
        }
    }

    Ok(parsed)
}

fn print_headless_help() {
    println!(
        "Usage: dnorm [options]\n  --plan <path>\n  --mesh <path>\n  --save <path>\n  --print\n  --verbose | -v"
    );
}

fn load_headless_plan(path: &Path) -> Result<HeadlessPlan, String> {
    let data = std::fs::read(path).map_err(|err| format!("{}: {err}", path.display()))?;
    serde_json::from_slice(&data).map_err(|err| format!("{}: {err}", path.display()))
}

fn load_mesh_json(path: &Path) -> Result<Mesh, String> {
    let data = std::fs::read(path).map_err(|err| format!("{}: {err}", path.display()))?;
    let mesh: Mesh =
        serde_json::from_slice(&data).map_err(|err| format!("{}: {err}", path.display()))?;
    mesh.validate()
        .map_err(|err| format!("{}: {err}", path.display()))?;
    Ok(mesh)
}

fn save_mesh_json(mesh: &Mesh, path: &Path) -> Result<(), String> {
    let data = serde_json::to_vec_pretty(mesh).map_err(|err| err.to_string())?;
    std::fs::write(path, data).map_err(|err| format!("{}: {err}", path.display()))
}

fn default_headless_plan() -> HeadlessPlan {
    HeadlessPlan {
        steps: vec![PlanStep::AddMissingAttributes, PlanStep::RegenerateColours],
        ..HeadlessPlan::default()
    }
}

fn default_mesh() -> Mesh {
    let mut mesh = dnorm_core::make_box([2.0, 2.0, 2.0]);
    mesh.shape_keys = vec!["Basis".to_string()];
    mesh
}

fn delta_key(mesh: &Mesh, shape_key: &str) -> Result<AttributeKey, String> {
    dnorm_core::shape_key_index(mesh, shape_key)
        .map(AttributeKey::Delta)
        .ok_or_else(|| format!("unknown shape key {shape_key}"))
}

fn edit_options(settings: &EditorSettings, masking: &Option<Masking>) -> EditOptions {
    match masking {
        Some(masking) => settings.edit.with_masking(masking.clone()),
        None => settings.edit.clone(),
    }
}

fn run_plan(plan: &HeadlessPlan, mut mesh: Mesh) -> Result<Mesh, String> {
    for (index, step) in plan.steps.iter().enumerate() {
        run_step(&plan.settings, step, &mut mesh)
            .map_err(|err| format!("step {index} ({step:?}): {err}"))?;
    }
    Ok(mesh)
}

fn run_step(settings: &EditorSettings, step: &PlanStep, mesh: &mut Mesh) -> Result<(), String> {
    let err = |err: dnorm_core::EditError| err.to_string();
    match step {
        PlanStep::AddMissingAttributes => {
            let created = dnorm_core::add_missing_attributes(mesh).map_err(err)?;
            tracing::info!("created attributes: {:?}", created);
        }
        PlanStep::DeleteAllAttributes => {
            let removed = dnorm_core::delete_all_attributes(mesh);
            tracing::info!("deleted attributes: {:?}", removed);
        }
        PlanStep::SetCurrentFromOriginal { masking } => {
            let current = mesh.current_normals();
            let options = edit_options(settings, masking);
            let next = dnorm_core::set_current_from_original(mesh, &current, &options).map_err(err)?;
            mesh.set_custom_normals(next).map_err(|e| e.to_string())?;
        }
        PlanStep::CaptureOriginal { masking } => {
            let current = mesh.current_normals();
            let options = edit_options(settings, masking);
            dnorm_core::capture_original_from_current(mesh, &current, &options).map_err(err)?;
        }
        PlanStep::AddDeltaToCurrent { shape_key, masking } => {
            let key = delta_key(mesh, shape_key)?;
            let current = mesh.current_normals();
            let options = edit_options(settings, masking);
            let next = dnorm_core::add_delta_to_current(mesh, &current, key, &options).map_err(err)?;
            mesh.set_custom_normals(next).map_err(|e| e.to_string())?;
        }
        PlanStep::SetCurrentFromOriginalPlusDelta { shape_key, masking } => {
            let key = delta_key(mesh, shape_key)?;
            let current = mesh.current_normals();
            let options = edit_options(settings, masking);
            let next = dnorm_core::set_current_from_original_plus_delta(mesh, &current, key, &options)
                .map_err(err)?;
            mesh.set_custom_normals(next).map_err(|e| e.to_string())?;
        }
        PlanStep::CaptureDelta { shape_key, masking } => {
            let key = delta_key(mesh, shape_key)?;
            let current = mesh.current_normals();
            let options = edit_options(settings, masking);
            dnorm_core::capture_delta_from_current(mesh, &current, key, &options).map_err(err)?;
        }
        PlanStep::RetargetDelta { shape_key, masking } => {
            let key = delta_key(mesh, shape_key)?;
            let current = mesh.current_normals();
            let options = edit_options(settings, masking);
            dnorm_core::retarget_delta(mesh, &current, key, &options).map_err(err)?;
        }
        PlanStep::ClearDelta { shape_key, masking } => {
            let key = delta_key(mesh, shape_key)?;
            let options = edit_options(settings, masking);
            dnorm_core::clear_delta(mesh, key, &options).map_err(err)?;
        }
        PlanStep::SwitchDomain { attribute } => {
            let domain = dnorm_core::switch_domain(mesh, attribute).map_err(err)?;
            tracing::info!("'{}' is now {:?}", attribute, domain);
        }
        PlanStep::RegenerateColours => {
            let current = mesh.current_normals();
            dnorm_core::regenerate_all_colours(mesh, &current).map_err(err)?;
        }
        PlanStep::Transfer {
            source,
            method,
            attribute,
            dest_attribute,
            masking,
        } => {
            let source = load_mesh_json(source)?;
            let options = TransferOptions {
                source_attribute: attribute.clone(),
                dest_attribute: dest_attribute.clone(),
                retargeting: settings.retargeting,
                masking: masking
                    .clone()
                    .unwrap_or_else(|| settings.edit.masking.clone()),
            };
            dnorm_core::transfer(&source, mesh, *method, &options).map_err(err)?;
        }
    }
    Ok(())
}
