//! Workflow engine
//!
//! This module contains the engine that runs the release steps in order.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use log::info;

use crate::config::{ReleaseConfig, load_release_config};
use crate::file_ops::{DeleteMode, delete};
use crate::release::{
    archive_path, compile_binary, extract_version, make_archive, process_github_links,
    read_description, release_name, release_tag, update_version_file,
};
use crate::structure::StructureAssembler;

use super::context::{ReleaseOutcome, WorkflowContext};

/// Options for a release build
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    /// Path to the settings file
    pub settings_path: PathBuf,
    /// Whether to build the archive
    pub make_package: bool,
    /// Whether an existing archive may be replaced
    pub overwrite: bool,
    /// Whether to use the existing binary instead of compiling
    pub skip_compile: bool,
}

/// Builds a release from a settings file
///
/// # Errors
/// * Returns an error if the settings cannot be loaded or any step fails
pub fn make_release(options: &ReleaseOptions) -> Result<ReleaseOutcome> {
    let config = load_release_config(&options.settings_path)?;
    run_release(config, options)
}

/// Runs the release steps for a loaded configuration
///
/// The steps are:
/// 1. Compile the binary
/// 2. Wipe the release folder
/// 3. Extract the version from the sources
/// 4. Stamp the version file
/// 5. Build the release structure
/// 6. Make the archive
/// 7. Extract the changelog excerpt
///
/// The first failing step stops the build. The release folder is left as
/// it is for inspection.
pub fn run_release(config: ReleaseConfig, options: &ReleaseOptions) -> Result<ReleaseOutcome> {
    let mut context = WorkflowContext::new(config);

    step_compile(&mut context, options).context("Compile step failed")?;
    step_cleanup(&mut context).context("Cleanup step failed")?;
    let version = step_extract_version(&mut context).context("Version step failed")?;
    step_update_version_file(&mut context).context("Version file step failed")?;
    step_build_structure(&mut context).context("Release structure step failed")?;
    let archive = step_make_package(&mut context, options).context("Package step failed")?;
    let description = step_changelog(&mut context).context("Changelog step failed")?;

    info!(
        "{} steps done, {} skipped",
        context.stats.steps_run, context.stats.steps_skipped
    );
    info!("SUCCESS!");

    let tag = archive
        .as_ref()
        .and_then(|path| path.file_name())
        .and_then(|name| release_tag(&name.to_string_lossy()));
    Ok(ReleaseOutcome {
        version,
        archive,
        release_tag: tag,
        description,
        assembly: context.stats.assembly,
    })
}

fn step_compile(context: &mut WorkflowContext, options: &ReleaseOptions) -> Result<()> {
    let script = context
        .config
        .settings
        .shell_compile_binary_script
        .as_deref()
        .filter(|script| !script.is_empty());
    let Some(script) = script else {
        info!("No compile script defined, skipping");
        context.increment_steps_skipped();
        return Ok(());
    };
    if options.skip_compile {
        info!("Compilation is not requested, skipping");
        context.increment_steps_skipped();
        return Ok(());
    }

    {
        let resolver = context.resolver();
        let script_path = context
            .config
            .settings_dir
            .join(resolver.macros().resolve(script)?);
        let binary = resolver.resolve_source_path(&context.config.settings.compiled_binary, false)?;
        compile_binary(&script_path, &context.config.settings_dir, &binary)?;
    }
    context.increment_steps_run();
    Ok(())
}

fn step_cleanup(context: &mut WorkflowContext) -> Result<()> {
    info!("Cleanup release folder...");
    let layout = &context.config.layout;
    delete(&layout.release_folder, &layout.project_root, DeleteMode::Tolerant)?;
    context.increment_steps_run();
    Ok(())
}

fn step_extract_version(context: &mut WorkflowContext) -> Result<crate::release::ReleaseVersion> {
    let file = context
        .resolver()
        .resolve_source_path(&context.config.settings.assembly_info_file, false)?;
    let version = extract_version(&file)?;
    context.version = Some(version);
    context.increment_steps_run();
    Ok(version)
}

fn step_update_version_file(context: &mut WorkflowContext) -> Result<()> {
    info!("Update version file...");
    let version_file = context
        .config
        .settings
        .miniavc_version_file
        .as_deref()
        .filter(|file| !file.is_empty());
    let Some(version_file) = version_file else {
        info!("=> no version file defined, skipping");
        context.increment_steps_skipped();
        return Ok(());
    };
    let version = context
        .version
        .ok_or_else(|| anyhow!("Version is not extracted yet"))?;

    let path = context.resolver().resolve_source_path(version_file, false)?;
    update_version_file(&path, version)?;
    context.increment_steps_run();
    Ok(())
}

fn step_build_structure(context: &mut WorkflowContext) -> Result<()> {
    let report = StructureAssembler::new(context.resolver())
        .folder_policy(context.config.settings.folder_policy())
        .assemble(&context.config.mapping)?;
    context.stats.assembly = report;
    context.increment_steps_run();
    Ok(())
}

fn step_make_package(
    context: &mut WorkflowContext,
    options: &ReleaseOptions,
) -> Result<Option<PathBuf>> {
    if !options.make_package {
        info!("No package requested, skipping.");
        context.increment_steps_skipped();
        return Ok(None);
    }
    let version = context
        .version
        .ok_or_else(|| anyhow!("Version is not extracted yet"))?;

    let archive = {
        let resolver = context.resolver();
        let settings = &context.config.settings;
        info!(
            "Making {} package...",
            settings.package_name.as_deref().unwrap_or("<NONE>")
        );
        let name = release_name(settings, &resolver, version)?;
        let archive = archive_path(settings, &resolver, &name)?;
        make_archive(&settings.shell_zip_binary, &archive, &resolver, options.overwrite)?
    };
    context.increment_steps_run();
    Ok(Some(archive))
}

fn step_changelog(context: &mut WorkflowContext) -> Result<Option<String>> {
    let changelog = context
        .config
        .settings
        .changelog_file
        .as_deref()
        .filter(|file| !file.is_empty());
    let Some(changelog) = changelog else {
        context.increment_steps_skipped();
        return Ok(None);
    };

    let description = {
        let settings = &context.config.settings;
        let file = context.resolver().resolve_source_path(changelog, false)?;
        let description = read_description(&file, &settings.changelog_breaker)?;
        match settings.github_repo.as_deref() {
            Some(repo) if !repo.is_empty() => process_github_links(&description, repo),
            _ => description,
        }
    };
    context.increment_steps_run();
    Ok(Some(description))
}
