use crate::binding::factory::{BodyFactory, BuiltBody};
use crate::binding::geometry::{self, BoxGeometry};
use crate::binding::path::{PathFlattener, SampledPathFlattener};
use crate::binding::pivot::{self, TransformOrigin};
use crate::binding::registry::{BindingRecord, BodyKind, ElementBodyRegistry, RenderKind, TrackedElement};
use crate::binding::rules::{BaseProperties, RuleSet, ShapeRuleResolver};
use crate::binding::source::RuleSource;
use crate::binding::sync::SyncLoop;
use crate::binding::BindingConfig;
use crate::engine::PhysicsEngine;
use crate::error::BindingError;
use crate::host::{HostTree, StyleProperty};
use crate::math::Vector2;
use crate::Result;

use std::sync::mpsc::{channel, Receiver, Sender};
use tracing::{debug, error, info, warn};

/// Startup state of a [`Controller`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No rule document requested. Permanent when the document declares none.
    Uninitialized,

    /// Rule document requested, not yet applied. Permanent after a fetch or parse failure.
    AwaitingRules,

    /// Rules applied, bodies built, sync running
    Ready,
}

/// Request for the rule document, produced by [`Controller::start`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRequest {
    /// Path relative to the current resource
    pub path: String,
}

/// Sent once when the controller becomes ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyEvent {
    /// Elements discovered through the marker attribute
    pub tracked: usize,

    /// Elements receiving per-step style updates
    pub enrolled: usize,
}

/// Owns the element tree, the engine and the registry linking the two
pub struct Controller<H: HostTree, E: PhysicsEngine> {
    host: H,
    engine: E,
    config: BindingConfig,
    state: ControllerState,
    rules: Option<RuleSet>,

    /// Discovery order
    elements: Vec<TrackedElement<H::Node>>,

    /// Indices into `elements` of the non-static ones
    enrolled: Vec<usize>,

    registry: ElementBodyRegistry,
    flattener: Box<dyn PathFlattener>,
    resize_listening: bool,

    /// Set once a rule delivery fails; later deliveries are refused
    rules_failed: bool,

    ready_subscribers: Vec<Sender<ReadyEvent>>,
}

impl<H: HostTree, E: PhysicsEngine> Controller<H, E> {
    /// Creates a controller with default settings
    pub fn new(host: H, engine: E) -> Self {
        Self::with_config(host, engine, BindingConfig::default())
    }

    /// Creates a controller and discovers every marked element
    pub fn with_config(host: H, engine: E, config: BindingConfig) -> Self {
        let elements = discover(&host, &config.marker_attribute);
        debug!(count = elements.len(), "physics elements discovered");

        Self {
            flattener: Box::new(SampledPathFlattener::new(config.path_sample_length)),
            host,
            engine,
            config,
            state: ControllerState::Uninitialized,
            rules: None,
            elements,
            enrolled: Vec::new(),
            registry: ElementBodyRegistry::new(),
            resize_listening: false,
            rules_failed: false,
            ready_subscribers: Vec::new(),
        }
    }

    /// Replaces the routine used to flatten `<path>` data
    pub fn with_path_flattener(mut self, flattener: Box<dyn PathFlattener>) -> Self {
        self.flattener = flattener;
        self
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    pub fn rules(&self) -> Option<&RuleSet> {
        self.rules.as_ref()
    }

    pub fn registry(&self) -> &ElementBodyRegistry {
        &self.registry
    }

    pub fn elements(&self) -> &[TrackedElement<H::Node>] {
        &self.elements
    }

    /// Elements receiving per-step style updates, in discovery order
    pub fn enrolled(&self) -> impl Iterator<Item = &TrackedElement<H::Node>> {
        self.enrolled.iter().map(move |&i| &self.elements[i])
    }

    pub fn is_enrolled(&self, id: &str) -> bool {
        self.enrolled().any(|element| element.id == id)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Whether viewport changes trigger a rebuild
    pub fn is_listening_for_resize(&self) -> bool {
        self.resize_listening
    }

    /// Returns a receiver that gets exactly one [`ReadyEvent`] when the
    /// controller reaches [`ControllerState::Ready`]. If it already has, the
    /// event is waiting in the receiver.
    pub fn subscribe_ready(&mut self) -> Receiver<ReadyEvent> {
        let (sender, receiver) = channel();
        if self.state == ControllerState::Ready {
            let _ = sender.send(self.ready_event());
        } else {
            self.ready_subscribers.push(sender);
        }
        receiver
    }

    /// Looks up the rule document declaration.
    ///
    /// Without one, nothing is ever built and the controller stays
    /// `Uninitialized`. Otherwise it moves to `AwaitingRules` and returns what
    /// to fetch.
    pub fn start(&mut self) -> Result<Option<RuleRequest>> {
        if self.state != ControllerState::Uninitialized {
            return Err(BindingError::InvalidState(format!("start called in {:?}", self.state)));
        }

        match self.host.meta_content(&self.config.rules_meta_name) {
            None => {
                info!("No rules imported.");
                Ok(None)
            }
            Some(content) => {
                self.state = ControllerState::AwaitingRules;
                let path = format!("./{}", content);
                debug!(%path, "rule document requested");
                Ok(Some(RuleRequest { path }))
            }
        }
    }

    /// Completes a request issued by [`start`](Self::start) with the fetched
    /// document, or with the fetch error.
    ///
    /// Any failure is logged and leaves the controller in `AwaitingRules` for
    /// good: later deliveries are refused.
    pub fn complete_rules(&mut self, fetched: Result<String>) -> Result<()> {
        if self.state != ControllerState::AwaitingRules {
            return Err(BindingError::InvalidState(format!(
                "rules delivered in {:?}",
                self.state
            )));
        }

        if self.rules_failed {
            return Err(BindingError::InvalidState(
                "rule delivery already failed".to_string(),
            ));
        }

        let rules = fetched
            .and_then(|document| RuleSet::from_json(&document))
            .map_err(|err| {
                error!(%err, "Error fetching physics rules");
                self.rules_failed = true;
                err
            })?;

        self.apply_rules(rules)
    }

    /// Runs the whole startup sequence against a synchronous rule source
    pub fn bootstrap<S: RuleSource>(&mut self, source: &S) -> Result<ControllerState> {
        if let Some(request) = self.start()? {
            let fetched = source.fetch(&request.path);
            self.complete_rules(fetched)?;
        }
        Ok(self.state)
    }

    /// Stores the rules, starts the clock, and builds every element's body.
    ///
    /// Accepted from `Uninitialized` as well, for callers that already hold
    /// the rules. Elements whose body cannot be built are skipped and keep
    /// their normal flow position.
    pub fn apply_rules(&mut self, rules: RuleSet) -> Result<()> {
        if self.state == ControllerState::Ready {
            return Err(BindingError::InvalidState("rules already applied".to_string()));
        }
        if self.rules_failed {
            return Err(BindingError::InvalidState(
                "rule delivery already failed".to_string(),
            ));
        }

        info!(classifications = rules.len(), "applying physics rules");
        self.rules = Some(rules);

        if self.config.debug_render {
            self.engine.run_renderer();
        }
        self.engine.run();

        for index in 0..self.elements.len() {
            let (id, classification, node) = {
                let element = &self.elements[index];
                (element.id.clone(), element.classification.clone(), element.node)
            };

            let is_static = match self.rules.as_ref().map(|r| r.is_static(&classification)) {
                Some(Ok(is_static)) => is_static,
                Some(Err(err)) => {
                    error!(element = %id, %err, "element skipped");
                    continue;
                }
                None => continue,
            };

            // an element that cannot be built stays in normal flow
            if let Err(err) = self.update_shape(&id) {
                error!(element = %id, %err, "failed to build body");
                continue;
            }

            if !is_static {
                self.host.set_style(node, StyleProperty::Position, "absolute");
                self.enrolled.push(index);
            }
        }

        self.resize_listening = true;
        self.state = ControllerState::Ready;

        let event = self.ready_event();
        for subscriber in self.ready_subscribers.drain(..) {
            let _ = subscriber.send(event);
        }
        info!(tracked = event.tracked, enrolled = event.enrolled, "physics ready");

        Ok(())
    }

    /// Builds (or rebuilds) the body of one element and records the binding.
    /// Any body previously bound to `id` leaves the world first.
    pub fn update_shape(&mut self, id: &str) -> Result<()> {
        let rules = self
            .rules
            .as_ref()
            .ok_or_else(|| BindingError::InvalidState("rules not applied".to_string()))?;

        let node = self
            .host
            .element_by_id(id)
            .ok_or_else(|| BindingError::ElementNotFound(id.to_string()))?;
        let classification = self
            .host
            .attribute(node, &self.config.marker_attribute)
            .ok_or_else(|| BindingError::NotTracked(id.to_string()))?;

        let geometry = geometry::extract_box(&self.host, node)?;
        let base = BaseProperties {
            chamfer_radius: geometry.border_radius,
            angle: geometry::extract_rotation(&self.host, node),
        };
        let options = ShapeRuleResolver::new(rules).resolve(&classification, base)?;

        let kind = RenderKind::from_tag(&self.host.tag_name(node));
        let mut factory = BodyFactory::new(&mut self.engine);

        let built = match kind {
            RenderKind::Primitive => {
                factory.build_primitive(geometry.center(), geometry.width, geometry.height, &options)
            }
            RenderKind::Composite => {
                let shapes = geometry::extract_vector_shapes(&self.host, node, self.flattener.as_ref());
                factory.build_composite(geometry.center(), &shapes, &options)
            }
        };

        let body_kind = match built {
            BuiltBody::Primitive { body } => BodyKind::Primitive { body },
            BuiltBody::Composite { composite, pivot } => {
                let offset = pivot::pivot_offset(factory.engine(), built.object());
                match offset {
                    Some(offset) => {
                        let origin = TransformOrigin::from_offset(offset, vector_box_size(&self.host, node, &geometry));
                        self.host.set_style(node, StyleProperty::TransformOrigin, &origin.to_string());
                    }
                    None => warn!(element = id, "composite has no geometry, offset undefined"),
                }
                BodyKind::Composite { composite, pivot, offset }
            }
        };

        let previous = self.registry.insert(
            id,
            BindingRecord {
                classification,
                kind: body_kind,
            },
        );
        factory.install(previous.map(|record| record.object()), &built);

        Ok(())
    }

    /// The per-step notification: pushes every enrolled element's body state
    /// into its style. No-op before `Ready`.
    pub fn after_update(&mut self) -> usize {
        if self.state != ControllerState::Ready {
            return 0;
        }
        let elements = self.enrolled.iter().map(|&i| &self.elements[i]);
        SyncLoop::run(&self.registry, elements, &self.engine, &mut self.host)
    }

    /// Advances the engine by `delta` seconds and synchronises
    pub fn tick(&mut self, delta: f32) -> usize {
        self.engine.update(delta);
        self.after_update()
    }

    /// Viewport-changed notification: rebuilds every tracked element's body.
    /// Ignored until the controller is ready.
    pub fn handle_resize(&mut self) {
        if !self.resize_listening {
            return;
        }

        let ids: Vec<String> = self.elements.iter().map(|e| e.id.clone()).collect();
        debug!(count = ids.len(), "viewport changed, rebuilding bodies");
        for id in ids {
            if let Err(err) = self.update_shape(&id) {
                error!(element = %id, %err, "failed to rebuild body");
            }
        }
    }

    fn ready_event(&self) -> ReadyEvent {
        ReadyEvent {
            tracked: self.elements.len(),
            enrolled: self.enrolled.len(),
        }
    }
}

/// Size of the vector container's drawn content, falling back to its box
fn vector_box_size<H: HostTree>(host: &H, node: H::Node, geometry: &BoxGeometry) -> Vector2 {
    host.bbox(node)
        .map(|bbox| bbox.size())
        .unwrap_or(Vector2::new(geometry.width, geometry.height))
}

fn discover<H: HostTree>(host: &H, marker: &str) -> Vec<TrackedElement<H::Node>> {
    host.query_by_attribute(marker)
        .into_iter()
        .filter_map(|node| {
            let classification = host.attribute(node, marker)?;
            let Some(id) = host.id_of(node).filter(|id| !id.is_empty()) else {
                warn!(%classification, "marked element has no id, ignored");
                return None;
            };
            Some(TrackedElement {
                node,
                id,
                classification,
                kind: RenderKind::from_tag(&host.tag_name(node)),
            })
        })
        .collect()
}
