#![allow(dead_code)]

use physics::{Engine, EngineOptions, Model};

pub const PENDULUM: &str = r#"{
    "name": "pendulum",
    "links": [
        { "name": "base" },
        { "name": "arm", "mass": 1.0, "inertia": 0.08, "com": [0.0, -0.5] }
    ],
    "joints": [
        { "name": "pivot", "type": "revolute", "parent": "base", "child": "arm" }
    ]
}"#;

pub const CART_POLE: &str = r#"{
    "name": "cart_pole",
    "links": [
        { "name": "rail" },
        { "name": "cart", "mass": 1.0 },
        { "name": "pole", "mass": 0.1, "inertia": 0.0083, "com": [0.0, 0.5] }
    ],
    "joints": [
        { "name": "slide", "type": "prismatic", "axis": [1.0, 0.0],
          "parent": "rail", "child": "cart", "effort": 5.0 },
        { "name": "hinge", "type": "revolute", "parent": "cart", "child": "pole" }
    ]
}"#;

pub fn pendulum() -> Engine {
    Engine::new(Model::from_json(PENDULUM, &["pivot"]).unwrap()).unwrap()
}

pub fn cart_pole(options: EngineOptions) -> Engine {
    let mut model = Model::from_json(CART_POLE, &["slide"]).unwrap();
    model.add_encoder_sensor("Slider", "slide").unwrap();
    model.add_encoder_sensor("Pole", "hinge").unwrap();
    Engine::with_options(model, options).unwrap()
}
