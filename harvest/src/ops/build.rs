//! Build operation - run every feature over one module.

use std::{
    collections::{HashSet, VecDeque},
    path::{Path, PathBuf},
};

use eyre::{Context, Result};
use harvester_config::ConfigSource;
use harvester_core::{Artifact, CancellationToken, WriteResult};
use harvester_pipeline::{
    METADATA_FILE_NAME, ModuleGraph, ModuleId, ModuleMetadata, PassInput, SnapshotPlugin,
};
use harvester_syntax::SourceModule;

use crate::{
    features,
    reports::{BuildReport, FeatureSummary, WrittenFile},
};

/// Options for the build operation.
pub struct BuildOptions<'a> {
    /// Name of the module being built.
    pub module: &'a str,
    /// Directory holding the module's sources.
    pub src_dir: &'a Path,
    /// Directory artifacts and metadata are written to.
    pub out_dir: &'a Path,
    pub config: Option<&'a ConfigSource>,
    /// Metadata files of referenced modules.
    pub references: &'a [PathBuf],
    /// Whether to output debug snapshots.
    pub visualize: bool,
}

/// Look for a config source next to the sources, then in the sources.
pub fn discover_config(src_dir: &Path) -> harvester_config::Result<Option<ConfigSource>> {
    let parent = match src_dir.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => src_dir,
    };
    if parent != src_dir
        && let Some(source) = ConfigSource::discover(parent)?
    {
        return Ok(Some(source));
    }
    ConfigSource::discover(src_dir)
}

/// Execute the build operation.
///
/// Loads the module and its references, runs the pipeline and writes every
/// artifact plus the module's metadata into the output directory.
pub fn build(opts: BuildOptions) -> Result<BuildReport> {
    let cancel = CancellationToken::new();
    let module = SourceModule::load_dir(opts.module, opts.src_dir, &cancel)
        .wrap_err_with(|| format!("Failed to load module '{}'", opts.module))?;
    let (graph, references) = load_graph(opts.references)?;
    tracing::info!(
        module = opts.module,
        nodes = module.node_count(),
        upstream = graph.len(),
        "building module"
    );

    let debug_dir = opts.out_dir.join(".harvest/debug");
    let mut pipeline = features::pipeline();
    if opts.visualize {
        pipeline = pipeline.plugin(SnapshotPlugin::with_output_dir(&debug_dir));
    }

    let output = pipeline
        .run(&PassInput {
            config: opts.config,
            module: &module,
            graph: &graph,
            references: &references,
            cancel: &cancel,
        })
        .wrap_err("Pipeline failed")?;

    let mut written = Vec::new();
    for artifact in output.artifacts() {
        written.push(write(artifact, opts.out_dir)?);
    }
    let metadata = Artifact::new(METADATA_FILE_NAME, output.metadata().to_json()?);
    written.push(write(&metadata, opts.out_dir)?);

    Ok(BuildReport {
        module: opts.module.to_owned(),
        config_path: opts.config.map(|c| c.path().to_path_buf()),
        output_dir: opts.out_dir.to_path_buf(),
        features: output
            .passes
            .iter()
            .map(|pass| FeatureSummary {
                name: pass.feature.clone(),
                action: pass.action.to_string(),
                facts_local: pass.stats.facts_local,
                facts_recovered: pass.stats.facts_recovered,
            })
            .collect(),
        written,
        errors: output.diagnostics().map(ToString::to_string).collect(),
        debug_dir: opts.visualize.then_some(debug_dir),
    })
}

fn write(artifact: &Artifact, out_dir: &Path) -> Result<WrittenFile> {
    let result = artifact
        .write(out_dir)
        .wrap_err_with(|| format!("Failed to write {}", artifact.name()))?;
    Ok(WrittenFile {
        name: artifact.name().to_owned(),
        changed: result == WriteResult::Written,
        cleared: artifact.is_empty(),
    })
}

/// Load the metadata files in `paths`, then every module they reference
/// whose metadata sits in a sibling output directory
/// (`<dir>/../<module>/harvest.metadata.json`).
///
/// Returns the graph and the direct references, in the order given.
pub fn load_graph(paths: &[PathBuf]) -> Result<(ModuleGraph, Vec<ModuleId>)> {
    let mut graph = ModuleGraph::new();
    let mut direct = Vec::new();
    let mut queue: VecDeque<(PathBuf, bool)> = paths.iter().map(|p| (p.clone(), true)).collect();
    let mut visited = HashSet::new();

    while let Some((path, is_direct)) = queue.pop_front() {
        if !visited.insert(path.clone()) {
            continue;
        }
        let metadata = ModuleMetadata::load(&path)?;
        if is_direct {
            direct.push(metadata.module.clone());
        }

        for reference in &metadata.references {
            match sibling_metadata(&path, reference) {
                Some(sibling) => queue.push_back((sibling, false)),
                None => tracing::debug!(
                    module = %reference,
                    from = %path.display(),
                    "no sibling metadata; relying on explicit references"
                ),
            }
        }

        if !graph.insert(metadata) {
            tracing::warn!(path = %path.display(), "duplicate module metadata ignored");
        }
    }

    Ok((graph, direct))
}

fn sibling_metadata(path: &Path, module: &ModuleId) -> Option<PathBuf> {
    let candidate = path
        .parent()?
        .parent()?
        .join(module.as_str())
        .join(METADATA_FILE_NAME);
    candidate.is_file().then_some(candidate)
}
