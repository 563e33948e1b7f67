use phys_bind::binding::pivot;
use phys_bind::binding::{RuleRequest, StaticRuleSource, FsRuleSource};
use phys_bind::error::BindingError;
use phys_bind::host::{ElementSpec, NodeId};
use phys_bind::math::Rect;
use phys_bind::{
    BodyKind, Controller, ControllerState, KinematicWorld, MemoryDocument, PhysicsEngine, RuleSet,
    SimObject, StyleProperty, Vector2, Viewport, WorldConfig,
};
use approx::assert_relative_eq;
use rand::Rng;
use tracing_subscriber::EnvFilter;

const RULES: &str = r#"{
    "ball": { "restitution": 0.9 },
    "crate": { "density": 0.002, "friction": 0.4 },
    "floor": { "isStatic": true },
    "logo": { "frictionAir": 0.02 }
}"#;

type TestController = Controller<MemoryDocument, KinematicWorld>;

#[derive(Debug, Clone, Copy)]
struct Nodes {
    ball: NodeId,
    crate_box: NodeId,
    floor: NodeId,
    logo: NodeId,
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn page() -> (MemoryDocument, Nodes) {
    let mut doc = MemoryDocument::new(Viewport::new(1000.0, 800.0));
    doc.add_meta("physicsRules", "rules.json");

    let ball = doc.append(
        None,
        ElementSpec::new("svg")
            .id("ball")
            .attr("data-physics", "ball")
            .computed("width", "10px")
            .computed("height", "10px")
            .rect(Rect::new(100.0, 100.0, 10.0, 10.0))
            .bbox(Rect::new(0.0, 0.0, 10.0, 10.0)),
    );
    doc.append(Some(ball), ElementSpec::new("circle").attr("r", "5"));

    let crate_box = doc.append(
        None,
        ElementSpec::new("div")
            .id("crate")
            .attr("data-physics", "crate")
            .computed("width", "100px")
            .computed("height", "50px")
            .rect(Rect::new(200.0, 300.0, 100.0, 50.0)),
    );

    let floor = doc.append(
        None,
        ElementSpec::new("div")
            .id("floor")
            .attr("data-physics", "floor")
            .style("width", "100vw")
            .computed("height", "20px")
            .rect(Rect::new(0.0, 780.0, 1000.0, 20.0)),
    );

    let logo = doc.append(
        None,
        ElementSpec::new("svg")
            .id("logo")
            .attr("data-physics", "logo")
            .computed("width", "40px")
            .computed("height", "20px")
            .rect(Rect::new(400.0, 100.0, 40.0, 20.0))
            .bbox(Rect::new(0.0, 0.0, 40.0, 20.0)),
    );
    doc.append(Some(logo), ElementSpec::new("polygon").attr("points", "0,0 40,0 40,20 0,20"));
    doc.append(Some(logo), ElementSpec::new("circle").attr("r", "5"));

    let nodes = Nodes {
        ball,
        crate_box,
        floor,
        logo,
    };
    (doc, nodes)
}

fn controller(doc: MemoryDocument) -> TestController {
    init_logging();
    Controller::new(doc, KinematicWorld::with_config(WorldConfig::weightless()))
}

fn rule_source() -> StaticRuleSource {
    StaticRuleSource::new().with_document("rules.json", RULES)
}

fn ready_controller() -> (TestController, Nodes) {
    let (doc, nodes) = page();
    let mut controller = controller(doc);
    controller.bootstrap(&rule_source()).unwrap();
    (controller, nodes)
}

fn px(value: Option<&str>) -> f32 {
    value
        .and_then(|v| v.strip_suffix("px"))
        .and_then(|v| v.parse().ok())
        .unwrap()
}

fn degrees(transform: Option<&str>) -> f32 {
    transform
        .and_then(|t| t.strip_prefix("rotateZ("))
        .and_then(|t| t.strip_suffix("deg)"))
        .and_then(|t| t.parse().ok())
        .unwrap()
}

#[test]
fn test_start_requests_relative_rule_document() {
    let (doc, _) = page();
    let mut controller = controller(doc);

    assert_eq!(controller.state(), ControllerState::Uninitialized);
    assert_eq!(
        controller.start().unwrap(),
        Some(RuleRequest {
            path: "./rules.json".to_string()
        })
    );
    assert_eq!(controller.state(), ControllerState::AwaitingRules);
    assert!(matches!(controller.start(), Err(BindingError::InvalidState(_))));
}

#[test]
fn test_vector_element_becomes_composite() {
    let (controller, nodes) = ready_controller();
    assert_eq!(controller.state(), ControllerState::Ready);

    let record = controller.registry().get("ball").unwrap();
    assert_eq!(record.classification, "ball");
    let BodyKind::Composite { composite, pivot: Some(pivot), offset: Some(offset) } = record.kind else {
        panic!("expected a composite with a pivot, got {:?}", record.kind);
    };

    let world = controller.engine();
    assert_eq!(world.all_bodies(SimObject::Composite(composite)), vec![pivot]);
    assert_eq!(world.body(pivot).unwrap().position, Vector2::new(105.0, 105.0));
    assert_eq!(world.body(pivot).unwrap().vertices.len(), 10);

    // ten-sided circle: leftmost vertices at 162° and 198°, topmost at 270°
    assert_relative_eq!(offset.x, -4.755_283, epsilon = 1e-3);
    assert_relative_eq!(offset.y, -5.0, epsilon = 1e-3);

    let doc = controller.host();
    assert_eq!(doc.style(nodes.ball, StyleProperty::Position), Some("absolute"));
    assert!(controller.is_enrolled("ball"));

    let origin: Vec<f32> = doc
        .style(nodes.ball, StyleProperty::TransformOrigin)
        .unwrap()
        .split('%')
        .filter_map(|part| part.trim().parse().ok())
        .collect();
    assert_eq!(origin.len(), 2);
    assert_relative_eq!(origin[0], 47.552_83, epsilon = 1e-2);
    assert_relative_eq!(origin[1], 50.0, epsilon = 1e-2);
}

#[test]
fn test_multi_shape_composite() {
    let (controller, nodes) = ready_controller();

    let record = controller.registry().get("logo").unwrap();
    let BodyKind::Composite { composite, pivot: Some(pivot), offset: Some(offset) } = record.kind else {
        panic!("expected a composite, got {:?}", record.kind);
    };

    let bodies = controller.engine().all_bodies(SimObject::Composite(composite));
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0], pivot);
    assert_relative_eq!(offset.x, -20.0, epsilon = 1e-3);
    assert_relative_eq!(offset.y, -10.0, epsilon = 1e-3);
    assert_eq!(
        controller.host().style(nodes.logo, StyleProperty::TransformOrigin),
        Some("50% 50%")
    );
}

#[test]
fn test_box_element_is_centred_on_its_rect() {
    let (mut controller, nodes) = ready_controller();

    let record = controller.registry().get("crate").unwrap();
    let BodyKind::Primitive { body } = record.kind else {
        panic!("expected a primitive, got {:?}", record.kind);
    };
    assert_eq!(controller.engine().body(body).unwrap().position, Vector2::new(250.0, 325.0));
    assert_eq!(controller.engine().get_body(body).unwrap().options().density, Some(0.002));

    assert_eq!(controller.tick(1.0 / 60.0), 3);

    let doc = controller.host();
    assert_eq!(doc.style(nodes.crate_box, StyleProperty::Left), Some("200px"));
    assert_eq!(doc.style(nodes.crate_box, StyleProperty::Top), Some("300px"));
    assert_eq!(doc.style(nodes.crate_box, StyleProperty::Transform), Some("rotateZ(0deg)"));
}

#[test]
fn test_static_elements_are_built_but_not_synced() {
    let (mut controller, nodes) = ready_controller();

    let record = controller.registry().get("floor").unwrap();
    let BodyKind::Primitive { body } = record.kind else {
        panic!("expected a primitive, got {:?}", record.kind);
    };
    assert!(controller.engine().get_body(body).unwrap().is_static());
    assert!(controller.engine().contains(SimObject::Body(body)));
    assert!(!controller.is_enrolled("floor"));

    controller.tick(1.0 / 60.0);

    let doc = controller.host();
    assert_eq!(doc.style(nodes.floor, StyleProperty::Position), None);
    assert_eq!(doc.style(nodes.floor, StyleProperty::Left), None);
    assert_eq!(doc.style(nodes.floor, StyleProperty::Transform), None);
}

#[test]
fn test_no_rules_declared() {
    let mut doc = MemoryDocument::new(Viewport::new(1000.0, 800.0));
    doc.append(
        None,
        ElementSpec::new("div")
            .id("crate")
            .attr("data-physics", "crate")
            .computed("width", "100px")
            .computed("height", "50px"),
    );
    let mut controller = controller(doc);

    assert_eq!(controller.start().unwrap(), None);
    assert_eq!(controller.state(), ControllerState::Uninitialized);
    assert_eq!(controller.tick(1.0 / 60.0), 0);
    controller.handle_resize();

    assert!(controller.registry().is_empty());
    assert_eq!(controller.host().style_writes(), 0);
    assert!(!controller.engine().is_running());
    assert_eq!(controller.engine().body_count(), 0);
}

#[test]
fn test_missing_rule_document() {
    let (doc, _) = page();
    let mut controller = controller(doc);

    let result = controller.bootstrap(&StaticRuleSource::new());
    assert!(matches!(result, Err(BindingError::RuleFetch(_))));
    assert_eq!(controller.state(), ControllerState::AwaitingRules);
    assert!(controller.complete_rules(Ok(RULES.to_string())).is_err());
    assert_eq!(controller.state(), ControllerState::AwaitingRules);
    assert!(controller.registry().is_empty());
    assert_eq!(controller.host().style_writes(), 0);
    assert_eq!(controller.tick(1.0 / 60.0), 0);
}

#[test]
fn test_malformed_rule_document() {
    let (doc, _) = page();
    let mut controller = controller(doc);

    let source = StaticRuleSource::new().with_document("rules.json", "{ not json");
    assert!(matches!(controller.bootstrap(&source), Err(BindingError::RuleParse(_))));
    assert_eq!(controller.state(), ControllerState::AwaitingRules);
    assert!(controller.rules().is_none());

    // the failure is final
    assert!(matches!(
        controller.complete_rules(Ok(RULES.to_string())),
        Err(BindingError::InvalidState(_))
    ));
    assert!(matches!(
        controller.apply_rules(RuleSet::from_json(RULES).unwrap()),
        Err(BindingError::InvalidState(_))
    ));
    assert_eq!(controller.state(), ControllerState::AwaitingRules);
    assert!(controller.registry().is_empty());
    assert_eq!(controller.host().style_writes(), 0);
}

#[test]
fn test_unknown_classification_skips_only_that_element() {
    let (mut doc, _) = page();
    let ghost = doc.append(
        None,
        ElementSpec::new("div")
            .id("ghost")
            .attr("data-physics", "ghost")
            .computed("width", "10px")
            .computed("height", "10px"),
    );
    let mut controller = controller(doc);
    controller.bootstrap(&rule_source()).unwrap();

    assert_eq!(controller.state(), ControllerState::Ready);
    assert_eq!(controller.elements().len(), 5);
    assert_eq!(controller.registry().len(), 4);
    assert!(!controller.registry().contains("ghost"));
    assert!(!controller.is_enrolled("ghost"));
    assert_eq!(controller.host().style(ghost, StyleProperty::Position), None);
}

#[test]
fn test_unmeasurable_element_is_skipped() {
    let (mut doc, _) = page();
    let text = doc.append(
        None,
        ElementSpec::new("div")
            .id("text")
            .attr("data-physics", "crate")
            .computed("width", "12em")
            .computed("height", "10px"),
    );
    let mut controller = controller(doc);
    controller.bootstrap(&rule_source()).unwrap();

    assert_eq!(controller.state(), ControllerState::Ready);
    assert!(!controller.registry().contains("text"));
    assert!(controller.registry().contains("crate"));
    assert!(!controller.is_enrolled("text"));
    assert_eq!(controller.host().style(text, StyleProperty::Position), None);
    assert_eq!(controller.tick(1.0 / 60.0), 3);
    assert_eq!(controller.host().style(text, StyleProperty::Left), None);
}

#[test]
fn test_elements_without_id_are_ignored() {
    let (mut doc, _) = page();
    doc.append(
        None,
        ElementSpec::new("div")
            .attr("data-physics", "crate")
            .computed("width", "10px")
            .computed("height", "10px"),
    );
    let controller = controller(doc);
    let ids: Vec<&str> = controller.elements().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["ball", "crate", "floor", "logo"]);
}

#[test]
fn test_ready_is_signalled_once() {
    let (doc, _) = page();
    let mut controller = controller(doc);
    let early = controller.subscribe_ready();
    assert!(early.try_recv().is_err());

    controller.bootstrap(&rule_source()).unwrap();

    let event = early.try_recv().unwrap();
    assert_eq!(event.tracked, 4);
    assert_eq!(event.enrolled, 3);
    assert!(early.try_recv().is_err());

    let late = controller.subscribe_ready();
    assert_eq!(late.try_recv().unwrap(), event);
}

#[test]
fn test_rules_can_be_applied_directly() {
    let (doc, _) = page();
    let mut controller = controller(doc);

    controller.apply_rules(RuleSet::from_json(RULES).unwrap()).unwrap();
    assert_eq!(controller.state(), ControllerState::Ready);
    assert!(controller.engine().is_running());
    assert!(controller.engine().is_renderer_running());
    assert!(controller.is_listening_for_resize());

    assert!(matches!(
        controller.apply_rules(RuleSet::default()),
        Err(BindingError::InvalidState(_))
    ));
    assert!(matches!(
        controller.complete_rules(Ok(RULES.to_string())),
        Err(BindingError::InvalidState(_))
    ));
}

#[test]
fn test_update_shape_errors() {
    let (doc, _) = page();
    let mut controller = controller(doc);
    assert!(matches!(controller.update_shape("crate"), Err(BindingError::InvalidState(_))));

    controller.bootstrap(&rule_source()).unwrap();
    assert!(matches!(controller.update_shape("nope"), Err(BindingError::ElementNotFound(_))));
}

#[test]
fn test_rebuild_keeps_one_body_per_element() {
    let (mut controller, nodes) = ready_controller();
    assert_eq!(controller.engine().objects().len(), 4);
    assert_eq!(controller.engine().world_body_count(), 5);

    let old_floor = controller.registry().get("floor").unwrap().object();

    controller.host_mut().set_viewport(Viewport::new(500.0, 800.0));
    controller.handle_resize();
    controller.handle_resize();

    let world = controller.engine();
    assert_eq!(world.objects().len(), 4);
    assert_eq!(world.world_body_count(), 5);
    assert!(!world.contains(old_floor));
    for (_, record) in controller.registry().iter() {
        assert!(world.contains(record.object()));
    }

    // 100vw now resolves against the narrower viewport
    let BodyKind::Primitive { body } = controller.registry().get("floor").unwrap().kind else {
        panic!("floor should be a primitive");
    };
    let vertices = world.body(body).unwrap().vertices;
    assert_relative_eq!(vertices[1].x - vertices[0].x, 500.0, epsilon = 1e-3);

    assert_eq!(
        controller.host().style(nodes.ball, StyleProperty::Position),
        Some("absolute")
    );
}

#[test]
fn test_repeated_resize_frees_replaced_bodies() {
    let (mut controller, _) = ready_controller();
    let stored = controller.engine().body_count();

    for _ in 0..100 {
        controller.handle_resize();
        controller.tick(1.0 / 60.0);
    }

    let world = controller.engine();
    assert_eq!(world.body_count(), stored);
    assert_eq!(world.world_body_count(), 5);
    assert!(world.events().is_empty());
}

#[test]
fn test_resize_before_ready_is_ignored() {
    let (doc, _) = page();
    let mut controller = controller(doc);
    assert!(!controller.is_listening_for_resize());
    controller.handle_resize();
    assert!(controller.registry().is_empty());
    assert_eq!(controller.engine().body_count(), 0);
}

#[test]
fn test_rotation_is_written_and_survives_rebuild() {
    let (mut controller, nodes) = ready_controller();
    let BodyKind::Primitive { body } = controller.registry().get("crate").unwrap().kind else {
        panic!("crate should be a primitive");
    };

    controller
        .engine_mut()
        .get_body_mut(body)
        .unwrap()
        .set_angle(std::f32::consts::FRAC_PI_2);
    controller.tick(1.0 / 60.0);

    let first = controller
        .host()
        .style(nodes.crate_box, StyleProperty::Transform)
        .map(str::to_string);
    assert_relative_eq!(degrees(first.as_deref()), 90.0, epsilon = 1e-3);

    // unchanged angle, unchanged transform
    controller.tick(1.0 / 60.0);
    assert_eq!(
        controller.host().style(nodes.crate_box, StyleProperty::Transform),
        first.as_deref()
    );

    controller.handle_resize();
    let BodyKind::Primitive { body } = controller.registry().get("crate").unwrap().kind else {
        panic!("crate should be a primitive");
    };
    assert_relative_eq!(
        controller.engine().body(body).unwrap().angle,
        std::f32::consts::FRAC_PI_2,
        epsilon = 1e-4
    );
}

#[test]
fn test_composite_placement_follows_centroid() {
    let (mut controller, nodes) = ready_controller();
    let record = controller.registry().get("logo").unwrap().clone();
    let BodyKind::Composite { composite, offset: Some(offset), .. } = record.kind else {
        panic!("logo should be a composite");
    };
    let object = SimObject::Composite(composite);

    // at build time the offset lands exactly on the box's top-left corner
    controller.after_update();
    let corner = pivot::north_west(controller.engine(), object).unwrap();
    assert_relative_eq!(px(controller.host().style(nodes.logo, StyleProperty::Left)), corner.x, epsilon = 1e-3);
    assert_relative_eq!(px(controller.host().style(nodes.logo, StyleProperty::Top)), corner.y, epsilon = 1e-3);

    let mut rng = rand::thread_rng();
    let bodies = controller.engine().all_bodies(object);
    for _ in 0..20 {
        let shift = Vector2::new(rng.gen_range(-200.0..200.0), rng.gen_range(-200.0..200.0));
        for handle in &bodies {
            let body = controller.engine_mut().get_body_mut(*handle).unwrap();
            let position = body.position();
            body.set_position(position + shift);
        }
        controller.after_update();

        let centre = pivot::centroid(controller.engine(), object).unwrap();
        let doc = controller.host();
        assert_relative_eq!(px(doc.style(nodes.logo, StyleProperty::Left)), centre.x + offset.x, epsilon = 1e-3);
        assert_relative_eq!(px(doc.style(nodes.logo, StyleProperty::Top)), centre.y + offset.y, epsilon = 1e-3);
    }
}

#[test]
fn test_rules_from_disk() {
    let dir = std::env::temp_dir().join(format!("phys-bind-rules-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("rules.json"), RULES).unwrap();

    let (doc, _) = page();
    let mut controller = controller(doc);
    let state = controller.bootstrap(&FsRuleSource::new(&dir)).unwrap();
    assert_eq!(state, ControllerState::Ready);
    assert_eq!(controller.registry().len(), 4);

    let mut missing = controller_without_rules();
    assert!(matches!(
        missing.bootstrap(&FsRuleSource::new(dir.join("nowhere"))),
        Err(BindingError::RuleFetch(_))
    ));

    std::fs::remove_dir_all(&dir).unwrap();
}

fn controller_without_rules() -> TestController {
    controller(page().0)
}
