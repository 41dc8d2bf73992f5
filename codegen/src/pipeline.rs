// Licensed under the Apache-2.0 license

//! The generation pipeline: one synchronous pass from the declaration
//! documents of a board directory to written artifacts.
//!
//! The order is fixed: load registries, parse peripherals, parse devices,
//! render both category artifacts in memory, then clear previously
//! generated files and write the new set. All fatal errors surface before
//! the first byte is written, so a failed run leaves the previous
//! artifacts in place. The clear-then-write window itself is not atomic;
//! a crash mid-write can leave a partial output directory, and the next
//! successful run repairs it.

use crate::board::BoardInfo;
use crate::declaration::{
    document_from_yaml, parse_devices, parse_peripherals, Declaration, PeripheralTable,
};
use crate::emit::{emit_category, emit_custom_header, Artifact, CUSTOM_TYPES_HEADER};
use crate::error::CodegenError;
use crate::plugin::{Category, ParseResult, PluginRegistry};
use crate::plugins;
use crate::resolve::{resolve_dependencies, role_format_tokens, Resolution};
use board_kconfig::{select_board, set_string_value, sync_section, Change};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub const PERIPHERALS_FILE: &str = "peripherals.yml";
pub const DEVICES_FILE: &str = "devices.yml";
pub const BOARD_FILE: &str = "board.toml";
pub const SDKCONFIG_FILE: &str = "sdkconfig";
pub const MENU_FILE: &str = "Kconfig.board";
pub const BOARD_INFO_FILE: &str = "board_info.toml";

const SECTION_HEADER: &str = "# BEGIN BOARD OPTIONS";
const SECTION_FOOTER: &str = "# END BOARD OPTIONS";
const BOARD_NAME_KEY: &str = "CONFIG_BOARD_NAME";

/// Everything one run needs to know about where it reads and writes.
/// Threaded explicitly through the pipeline; there is no global board
/// state.
pub struct BoardContext {
    pub board_dir: PathBuf,
    pub output_dir: PathBuf,
    pub board: BoardInfo,
}

impl BoardContext {
    /// Read `board.toml` from the board directory and build the context.
    pub fn load(board_dir: &Path, output_dir: &Path) -> Result<BoardContext, CodegenError> {
        let board = BoardInfo::from_file(&board_dir.join(BOARD_FILE))?;
        Ok(BoardContext {
            board_dir: board_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            board,
        })
    }
}

/// Outcome counts of one generation run.
#[derive(Debug)]
pub struct GenerateReport {
    pub peripherals: usize,
    pub devices: usize,
    pub sdkconfig_changes: Vec<Change>,
}

/// The parsed, validated state shared by `generate`, `check`, and
/// `resolve`.
struct Plan {
    periph_registry: PluginRegistry,
    dev_registry: PluginRegistry,
    peripherals: PeripheralTable,
    devices: Vec<Declaration>,
}

fn plan(ctx: &BoardContext) -> Result<Plan, CodegenError> {
    let chip = ctx.board.chip.as_str();
    let periph_registry =
        PluginRegistry::load(Category::Peripheral, plugins::peripheral_manifest(), chip)?;
    let dev_registry =
        PluginRegistry::load(Category::Device, plugins::device_manifest(), chip)?;

    let periph_doc = read_document(&ctx.board_dir.join(PERIPHERALS_FILE))?;
    let peripherals = parse_peripherals(&periph_doc, &periph_registry)?;
    let device_doc = read_document(&ctx.board_dir.join(DEVICES_FILE))?;
    let devices = parse_devices(&device_doc, &dev_registry, &peripherals)?;
    Ok(Plan {
        periph_registry,
        dev_registry,
        peripherals,
        devices,
    })
}

fn read_document(path: &Path) -> Result<crate::value::ConfigValue, CodegenError> {
    let text = std::fs::read_to_string(path).map_err(|err| CodegenError::Document {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    document_from_yaml(path, &text)
}

/// Run every declaration through its plugin. Plugin rejections are
/// logged and the declaration is skipped; the valid remainder is kept.
fn run_plugins(
    declarations: &[Declaration],
    registry: &PluginRegistry,
    peripherals: Option<&PeripheralTable>,
) -> Result<Vec<(Declaration, ParseResult)>, CodegenError> {
    let mut pairs = Vec::new();
    for declaration in declarations {
        let Some(plugin) = registry.get(&declaration.type_name) else {
            continue;
        };
        match plugin.parse(&declaration.name, &declaration.body, peripherals) {
            Ok(result) => pairs.push((declaration.clone(), result)),
            Err(err) if err.is_recoverable() => {
                log::warn!("skipping `{}`: {}", declaration.name, err);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(pairs)
}

/// Generate all artifacts for the board: the two category sources, the
/// custom-types header when needed, the Kconfig feature menu, the patched
/// sdkconfig, and the board metadata file.
pub fn generate(ctx: &BoardContext) -> Result<GenerateReport, CodegenError> {
    let plan = plan(ctx)?;

    let declared: Vec<Declaration> = plan.peripherals.iter().cloned().collect();
    let periph_pairs = run_plugins(&declared, &plan.periph_registry, None)?;
    let device_pairs =
        run_plugins(&plan.devices, &plan.dev_registry, Some(&plan.peripherals))?;

    let resolution = advisory_resolution(&plan);
    for (device, requirement) in &resolution.missing {
        log::info!("device `{}` has no selected `{}`", device, requirement);
    }

    let periph_artifact =
        emit_category(Category::Peripheral, &periph_pairs, &plan.periph_registry);
    let device_artifact = emit_category(Category::Device, &device_pairs, &plan.dev_registry);

    std::fs::create_dir_all(&ctx.output_dir)?;
    clear_generated(&ctx.output_dir)?;
    write_artifacts(ctx, &plan, &periph_artifact, &device_artifact)?;
    let sdkconfig_changes = patch_sdkconfig(ctx, &plan, false)?;
    ctx.board.write(&ctx.output_dir.join(BOARD_INFO_FILE))?;

    Ok(GenerateReport {
        peripherals: periph_pairs.len(),
        devices: device_pairs.len(),
        sdkconfig_changes,
    })
}

/// Compute the sdkconfig change set without writing anything.
pub fn check(ctx: &BoardContext) -> Result<Vec<Change>, CodegenError> {
    let plan = plan(ctx)?;
    patch_sdkconfig(ctx, &plan, true)
}

/// Advisory dependency report for the board's declarations.
pub fn resolve(ctx: &BoardContext) -> Result<Resolution, CodegenError> {
    let plan = plan(ctx)?;
    Ok(advisory_resolution(&plan))
}

fn advisory_resolution(plan: &Plan) -> Resolution {
    let descriptors: Vec<_> = plan
        .devices
        .iter()
        .filter_map(|declaration| {
            plan.dev_registry
                .get(&declaration.type_name)
                .map(|plugin| (declaration.name.clone(), plugin.dependencies()))
        })
        .collect();
    let selected: BTreeSet<String> =
        plan.peripherals.names().map(|n| n.to_string()).collect();
    let tokens = role_format_tokens(&plan.peripherals);
    resolve_dependencies(&descriptors, &selected, &tokens)
}

fn write_artifacts(
    ctx: &BoardContext,
    plan: &Plan,
    periph_artifact: &Artifact,
    device_artifact: &Artifact,
) -> Result<(), CodegenError> {
    let out = &ctx.output_dir;
    std::fs::write(
        out.join(Category::Peripheral.artifact_file()),
        &periph_artifact.source,
    )?;
    std::fs::write(
        out.join(Category::Device.artifact_file()),
        &device_artifact.source,
    )?;

    let mut definitions = periph_artifact.custom_definitions.clone();
    for definition in &device_artifact.custom_definitions {
        if !definitions.contains(definition) {
            definitions.push(definition.clone());
        }
    }
    if !definitions.is_empty() {
        std::fs::write(out.join(CUSTOM_TYPES_HEADER), emit_custom_header(&definitions))?;
    }

    let menu = board_kconfig::generate_menu(
        &ctx.board.name,
        &plan.periph_registry.type_names(),
        &plan.dev_registry.type_names(),
    );
    std::fs::write(out.join(MENU_FILE), menu)?;
    Ok(())
}

/// Remove the previous run's artifacts before writing the new set.
fn clear_generated(dir: &Path) -> std::io::Result<()> {
    let generated = [
        Category::Peripheral.artifact_file(),
        Category::Device.artifact_file(),
        CUSTOM_TYPES_HEADER,
        MENU_FILE,
        BOARD_INFO_FILE,
    ];
    for file in generated {
        let path = dir.join(file);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
    }
    Ok(())
}

/// Apply the three sdkconfig operations: managed-section sync over the
/// declared feature options, exclusive board selection, and the scalar
/// board-name key. A missing sdkconfig (or one without the managed
/// section) gets the section appended first.
fn patch_sdkconfig(
    ctx: &BoardContext,
    plan: &Plan,
    check_only: bool,
) -> Result<Vec<Change>, CodegenError> {
    let path = ctx.board_dir.join(SDKCONFIG_FILE);
    let original = if path.exists() {
        std::fs::read_to_string(&path)?
    } else {
        String::new()
    };

    let mut text = original.clone();
    if !text.lines().any(|l| l == SECTION_HEADER) {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(SECTION_HEADER);
        text.push('\n');
        text.push_str(SECTION_FOOTER);
        text.push('\n');
    }

    let desired = desired_options(plan);
    let (synced, changes) = sync_section(&text, SECTION_HEADER, SECTION_FOOTER, &desired)?;
    let selected = select_board(&synced, &ctx.board.board_option(), BOARD_NAME_KEY);
    let named = set_string_value(&selected, BOARD_NAME_KEY, &ctx.board.name);
    if !check_only && named != original {
        std::fs::write(&path, named)?;
    }
    Ok(changes)
}

/// The declared feature options: one `CONFIG_BOARD_PERIPH_<TYPE>` /
/// `CONFIG_BOARD_DEV_<TYPE>` key per type in use, all enabled.
fn desired_options(plan: &Plan) -> BTreeMap<String, bool> {
    let mut desired = BTreeMap::new();
    for declaration in plan.peripherals.iter() {
        desired.insert(
            format!(
                "CONFIG_BOARD_PERIPH_{}",
                declaration.type_name.to_ascii_uppercase()
            ),
            true,
        );
    }
    for declaration in &plan.devices {
        desired.insert(
            format!(
                "CONFIG_BOARD_DEV_{}",
                declaration.type_name.to_ascii_uppercase()
            ),
            true,
        );
    }
    desired
}
