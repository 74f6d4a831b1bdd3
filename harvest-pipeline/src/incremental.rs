//! Incremental passes that reuse work from the previous pass.

use std::collections::HashMap;

use harvester_config::{ConfigParseResult, ConfigSource};
use harvester_core::Cancelled;
use harvester_syntax::{SyntaxNode, UseScope};

use crate::{
    Feature, PassInput, PassOutput,
    controller::{complete_pass, evaluate_node, report_extraction_fault, resolve_config},
};

/// Everything extraction of one declaration depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NodeKey {
    crate_name: String,
    node: SyntaxNode,
    scope: UseScope,
}

struct ResolvedConfig<C> {
    source: Option<ConfigSource>,
    result: ConfigParseResult<C>,
}

/// Drives repeated passes of one feature, re-running only the stages whose
/// inputs changed.
///
/// The config is resolved again only when the config source changed, and
/// `matches`/`extract` only run on declarations not seen in the previous
/// pass. Outputs are identical to a cold [`Controller`](crate::Controller)
/// pass over the same inputs.
pub struct IncrementalDriver<F: Feature> {
    feature: F,
    config: Option<ResolvedConfig<F::Config>>,
    nodes: HashMap<NodeKey, Option<F::Fact>>,
}

impl<F: Feature> IncrementalDriver<F> {
    pub fn new(feature: F) -> Self {
        Self {
            feature,
            config: None,
            nodes: HashMap::new(),
        }
    }

    pub fn feature(&self) -> &F {
        &self.feature
    }

    /// Forget everything remembered from earlier passes.
    pub fn reset(&mut self) {
        self.config = None;
        self.nodes.clear();
    }

    /// Run one build pass.
    ///
    /// A cancelled pass leaves the remembered state of the previous pass
    /// untouched.
    pub fn run_pass(&mut self, input: &PassInput<'_>) -> Result<PassOutput, Cancelled> {
        input.cancel.check()?;
        let config_reparsed = self.refresh_config(input.config);
        let config = match &self.config {
            Some(resolved) => resolved.result.clone(),
            None => resolve_config(input.config),
        };
        input.cancel.check()?;

        let feature = &self.feature;
        let nodes = &mut self.nodes;
        let mut evaluated = 0;
        let mut reused = 0;

        let mut output = complete_pass(feature, &config, input, || {
            let mut next = HashMap::with_capacity(nodes.len());
            let mut facts = Vec::new();

            for ctx in input.module.contexts() {
                input.cancel.check()?;
                let key = NodeKey {
                    crate_name: ctx.crate_name().to_owned(),
                    node: ctx.node().clone(),
                    scope: ctx.scope().clone(),
                };

                let outcome = match nodes.get(&key) {
                    Some(cached) => {
                        reused += 1;
                        cached.clone()
                    }
                    None => {
                        evaluated += 1;
                        match evaluate_node(feature, &ctx) {
                            Ok(outcome) => outcome,
                            Err(error) => {
                                report_extraction_fault(feature, &ctx, &error);
                                continue;
                            }
                        }
                    }
                };

                if let Some(fact) = &outcome {
                    facts.push(fact.clone());
                }
                next.insert(key, outcome);
            }

            *nodes = next;
            Ok(facts)
        })?;

        output.stats.config_reparsed = config_reparsed;
        output.stats.nodes_evaluated = evaluated;
        output.stats.nodes_reused = reused;
        tracing::debug!(
            feature = self.feature.name(),
            config_reparsed,
            evaluated,
            reused,
            "incremental pass"
        );
        Ok(output)
    }

    /// Resolve the config again if its source changed. Returns whether it did.
    fn refresh_config(&mut self, source: Option<&ConfigSource>) -> bool {
        let unchanged = self
            .config
            .as_ref()
            .is_some_and(|resolved| resolved.source.as_ref() == source);
        if unchanged {
            return false;
        }

        self.config = Some(ResolvedConfig {
            source: source.cloned(),
            result: resolve_config(source),
        });
        true
    }
}
