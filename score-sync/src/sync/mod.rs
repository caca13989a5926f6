//! One-shot preparation: tag events, render, read markers back, compile.
//!
//! Everything here runs to completion before playback starts.
use std::sync::Arc;

use crate::config::SyncConfig;
use crate::dom::Score;
use crate::error::{ResolutionWarning, SyncResult};
use crate::model::EventModel;
use crate::playback::PlaybackController;
use crate::render::Engraver;
use crate::scene::{HostScene, ObjectHandle, SceneLoader, VisualState};
use crate::timeline::Timeline;

pub mod resolver;
pub mod tagger;

pub use resolver::{composite_warnings, resolve, Binding, Bindings, BoundObject};
pub use tagger::{tag, MarkerAssignment, MarkerTable, Palette, VisualMarker};

/// Score, linked to its rendered scene and ready for playback.
#[derive(Debug)]
pub struct PreparedScore<S: HostScene> {
    model: EventModel,
    tables: Vec<MarkerTable>,
    bindings: Bindings,
    warnings: Vec<ResolutionWarning>,
    scene: S,
    timeline: Arc<Timeline>,
    config: SyncConfig,
}

/// Build the event model, render every tagging pass and bind the geometry.
///
/// The scene of the first pass becomes the displayed one. Passes are
/// rendered from the same score, so their geometry is expected to be
/// identical; a pass with a different object count is skipped with a
/// warning.
pub fn prepare<E: Engraver, L: SceneLoader>(
    score: &Score,
    engraver: &mut E,
    loader: &mut L,
    config: SyncConfig,
) -> SyncResult<PreparedScore<L::Scene>> {
    let model = EventModel::build(score)?;
    let tables = tag(&model, &config)?;
    let mut bindings = Bindings::default();
    let mut warnings = Vec::new();
    let mut display: Option<L::Scene> = None;
    for table in tables.iter() {
        let output = engraver.engrave(score, &table.annotation_request())?;
        let scene = loader.load(&output.svg)?;
        if let Some(first) = &display {
            let (expected, found) = (first.objects().len(), scene.objects().len());
            if expected != found {
                warnings.push(ResolutionWarning::PassGeometryMismatch {
                    pass: table.pass,
                    expected,
                    found,
                });
                continue;
            }
        }
        let (pass_bindings, pass_warnings) = resolve(&scene, table);
        bindings.merge(pass_bindings);
        warnings.extend(pass_warnings);
        if display.is_none() {
            display = Some(scene);
        }
    }
    let Some(scene) = display else {
        return Err(crate::error::RenderError::Engraver(
            "no tagging pass was rendered".to_string(),
        )
        .into());
    };
    warnings.extend(composite_warnings(&model, &bindings));
    for warning in warnings.iter() {
        log::warn!("{}", warning);
    }
    let timeline = Arc::new(Timeline::compile(&model, &bindings, &config));
    let mut prepared = PreparedScore {
        model,
        tables,
        bindings,
        warnings,
        scene,
        timeline,
        config,
    };
    prepared.reset_scene();
    log::info!(
        "prepared {} bindings for {} events, {} warnings",
        prepared.bindings.len(),
        prepared.model.len(),
        prepared.warnings.len()
    );
    Ok(prepared)
}

impl<S: HostScene> PreparedScore<S> {
    pub fn model(&self) -> &EventModel {
        &self.model
    }
    pub fn tables(&self) -> &[MarkerTable] {
        &self.tables
    }
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }
    pub fn warnings(&self) -> &[ResolutionWarning] {
        &self.warnings
    }
    pub fn scene(&self) -> &S {
        &self.scene
    }
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }
    pub fn into_scene(self) -> S {
        self.scene
    }
    pub fn timeline(&self) -> Arc<Timeline> {
        self.timeline.clone()
    }
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Bound objects as one group, for the host to embed.
    pub fn group(&self) -> Vec<ObjectHandle> {
        self.bindings.handles()
    }

    /// Compile the timeline again with new playback settings.
    ///
    /// Tagging and rendering are not repeated. Controllers, created
    /// before, keep the old timeline.
    pub fn recompile(&mut self, config: SyncConfig) {
        self.timeline = Arc::new(Timeline::compile(&self.model, &self.bindings, &config));
        self.config = config;
        self.reset_scene();
    }

    pub fn controller(&self) -> PlaybackController {
        PlaybackController::new(self.timeline.clone(), &self.config)
    }

    /// Put every bound object into the inactive state, wiping the markers.
    fn reset_scene(&mut self) {
        let inactive =
            VisualState::new(self.config.inactive_color, self.config.inactive_opacity);
        for handle in self.bindings.handles() {
            self.scene.apply(handle, &inactive);
        }
    }
}
