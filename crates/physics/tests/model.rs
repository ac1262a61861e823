mod common;

use std::io::Write;

use physics::{Engine, Model, PhysicsError};

use common::{CART_POLE, PENDULUM};

#[test]
fn load_reads_description_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CART_POLE.as_bytes()).unwrap();

    let model = Model::load(file.path(), &["slide"]).unwrap();
    assert_eq!(model.name(), "cart_pole");
    assert_eq!(model.source(), Some(file.path()));
    assert_eq!(model.nx(), 4);
    assert_eq!(model.joint_names().collect::<Vec<_>>(), ["slide", "hinge"]);
    assert_eq!(model.link_names().count(), 3);
    assert_eq!(model.motor_count(), 1);
}

#[test]
fn missing_file_is_an_io_error() {
    let result = Model::load("/nonexistent/model.json", &[]);
    assert!(matches!(result, Err(PhysicsError::ModelIo { .. })));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let result = Model::from_json("{ \"name\": ", &[]);
    assert!(matches!(result, Err(PhysicsError::ModelParse(_))));
}

#[test]
fn unknown_motor_joint_is_rejected() {
    let result = Model::from_json(PENDULUM, &["elbow"]);
    assert!(matches!(result, Err(PhysicsError::UnknownJoint(name)) if name == "elbow"));
}

#[test]
fn structural_errors_are_rejected() {
    let cases = [
        // joint to a missing link
        r#"{ "name": "m", "links": [{ "name": "a" }],
             "joints": [{ "name": "j", "type": "revolute", "parent": "a", "child": "b" }] }"#,
        // two roots
        r#"{ "name": "m", "links": [{ "name": "a" }, { "name": "b", "mass": 1.0 }] }"#,
        // duplicated link
        r#"{ "name": "m", "links": [{ "name": "a" }, { "name": "a" }] }"#,
        // link with two parents
        r#"{ "name": "m",
             "links": [{ "name": "a" }, { "name": "b", "mass": 1.0 }],
             "joints": [
                 { "name": "j1", "type": "revolute", "parent": "a", "child": "b" },
                 { "name": "j2", "type": "revolute", "parent": "a", "child": "b" }
             ] }"#,
        // negative mass
        r#"{ "name": "m", "links": [{ "name": "a", "mass": -1.0 }] }"#,
        // zero prismatic axis
        r#"{ "name": "m",
             "links": [{ "name": "a" }, { "name": "b", "mass": 1.0 }],
             "joints": [{ "name": "j", "type": "prismatic", "axis": [0.0, 0.0],
                          "parent": "a", "child": "b" }] }"#,
    ];
    for json in cases {
        let result = Model::from_json(json, &[]);
        assert!(matches!(result, Err(PhysicsError::InvalidModel(_))), "accepted {json}");
    }
}

#[test]
fn duplicate_sensor_is_rejected() {
    let mut model = Model::from_json(CART_POLE, &[]).unwrap();
    model.add_encoder_sensor("Pole", "hinge").unwrap();
    let result = model.add_encoder_sensor("Pole", "slide");
    assert!(matches!(result, Err(PhysicsError::DuplicateSensor(_))));
    let result = model.add_encoder_sensor("Wheel", "axle");
    assert!(matches!(result, Err(PhysicsError::UnknownJoint(_))));
    assert_eq!(model.sensor_names().collect::<Vec<_>>(), ["Pole"]);
}

#[test]
fn massless_model_cannot_start_an_engine() {
    let json = r#"{ "name": "ghost",
        "links": [{ "name": "a" }, { "name": "b" }],
        "joints": [{ "name": "j", "type": "revolute", "parent": "a", "child": "b" }] }"#;
    let model = Model::from_json(json, &[]).unwrap();
    assert!(matches!(Engine::new(model), Err(PhysicsError::SingularMassMatrix)));
}
