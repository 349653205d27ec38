// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: Carries the config, target, layout, and current release through the pipeline.

use std::marker::PhantomData;

use crate::config::{Config, TargetConfig};
use crate::types::AppName;

use super::paths::DeployPaths;
use super::release::Release;
use super::state::{Done, Idle};

/// A deployment in progress against one target, parameterized by its
/// current pipeline state.
///
/// Transition methods consume `self` and return the next state, so an
/// out-of-order step (cutover before migration, pruning before cutover)
/// is a compile error rather than a runtime surprise.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) config: Config,
    pub(crate) target: TargetConfig,
    pub(crate) paths: DeployPaths,
    pub(crate) release: Option<Release>,
    pub(crate) pruned: Vec<String>,
    pub(crate) _state: PhantomData<S>,
}

impl Deployment<Idle> {
    pub fn new(config: Config, target: TargetConfig, paths: DeployPaths) -> Self {
        Deployment {
            config,
            target,
            paths,
            release: None,
            pruned: Vec::new(),
            _state: PhantomData,
        }
    }
}

impl<S> Deployment<S> {
    pub fn app(&self) -> &AppName {
        &self.config.app
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    pub fn paths(&self) -> &DeployPaths {
        &self.paths
    }

    /// The release this deployment is building (None before `create_release`).
    pub fn release(&self) -> Option<&Release> {
        self.release.as_ref()
    }
}

/// What a finished deployment produced.
#[derive(Debug, Clone)]
pub struct DeploySummary {
    pub release: Release,
    pub pruned: Vec<String>,
}

impl Deployment<Done> {
    /// Consume the deployment and return what it did.
    pub fn finish(self) -> DeploySummary {
        DeploySummary {
            release: self.release.expect("finished deployment must have a release"),
            pruned: self.pruned,
        }
    }
}
