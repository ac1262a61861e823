//! # Model Description
//!
//! A model is a tree of rigid links connected by one-degree-of-freedom
//! joints, described in JSON in the spirit of a URDF file:
//!
//! ```json
//! {
//!   "name": "pendulum",
//!   "links": [
//!     { "name": "base" },
//!     { "name": "arm", "mass": 1.0, "inertia": 0.08, "com": [0.0, -0.5] }
//!   ],
//!   "joints": [
//!     { "name": "pivot", "type": "revolute", "axis": 1.0,
//!       "parent": "base", "child": "arm", "origin": [0.0, 0.0] }
//!   ]
//! }
//! ```
//!
//! The one link that is nobody's child is the root and stays fixed in the
//! world. Each joint contributes one generalized coordinate, in the order the
//! joints appear in the file, so the state vector of a model with `n` joints
//! is `[q_0 .. q_n, v_0 .. v_n]`.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::PhysicsError;
use crate::options::{ModelOptions, SensorsOptions};
use crate::sensors::EncoderSensor;
use crate::types::Vec2;

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDescription {
    pub name: String,
    pub links: Vec<LinkDescription>,
    #[serde(default)]
    pub joints: Vec<JointDescription>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkDescription {
    pub name: String,
    #[serde(default)]
    pub mass: f64,
    /// Rotational inertia about the centre of mass (kg·m²).
    #[serde(default)]
    pub inertia: f64,
    /// Centre of mass in the link frame.
    #[serde(default)]
    pub com: [f64; 2],
}

#[derive(Clone, Debug, Deserialize)]
pub struct JointDescription {
    pub name: String,
    pub parent: String,
    pub child: String,
    /// Joint origin in the parent link frame.
    #[serde(default)]
    pub origin: [f64; 2],
    #[serde(flatten)]
    pub kind: JointKind,
    /// Largest command magnitude the joint accepts. Absent means unlimited.
    #[serde(default)]
    pub effort: Option<f64>,
    /// Viscous friction coefficient.
    #[serde(default)]
    pub damping: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JointKind {
    /// Translation along `axis`, expressed in the parent frame.
    Prismatic { axis: [f64; 2] },
    /// Rotation about +y, or about -y when `axis` is negative.
    Revolute {
        #[serde(default = "default_revolute_axis")]
        axis: f64,
    },
}

fn default_revolute_axis() -> f64 {
    1.0
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum JointType {
    Prismatic { axis: Vec2 },
    Revolute { sign: f64 },
}

#[derive(Clone, Debug)]
pub(crate) struct Link {
    pub name: String,
    pub mass: f64,
    pub inertia: f64,
    pub com: Vec2,
    pub parent_joint: Option<usize>,
}

#[derive(Clone, Debug)]
pub(crate) struct Joint {
    pub name: String,
    pub kind: JointType,
    pub parent_link: usize,
    pub child_link: usize,
    pub origin: Vec2,
    pub effort: Option<f64>,
    pub damping: f64,
    /// Joint that moves the parent link, `None` at the root.
    pub predecessor: Option<usize>,
}

/// A validated articulated model with its motors and sensors.
#[derive(Clone, Debug)]
pub struct Model {
    name: String,
    source: Option<PathBuf>,
    pub(crate) links: Vec<Link>,
    pub(crate) joints: Vec<Joint>,
    /// Joint indices ordered parents first.
    pub(crate) order: Vec<usize>,
    pub(crate) motors: Vec<usize>,
    pub(crate) sensors: Vec<EncoderSensor>,
    options: ModelOptions,
    sensors_options: SensorsOptions,
}

impl Model {
    /// Reads a description file and actuates the joints named in `motors`.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed, when the description is
    /// not a tree rooted at a single fixed link, or when a motor names an
    /// unknown joint.
    pub fn load(path: impl AsRef<Path>, motors: &[&str]) -> Result<Self, PhysicsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| PhysicsError::ModelIo {
            path: path.to_path_buf(),
            source,
        })?;
        let mut model = Self::from_json(&json, motors)?;
        model.source = Some(path.to_path_buf());
        tracing::debug!(model = %model.name, path = %path.display(), "model loaded");
        Ok(model)
    }

    /// Parses a description held in memory.
    ///
    /// # Errors
    ///
    /// Same as [`Model::load`], minus the I/O failure.
    pub fn from_json(json: &str, motors: &[&str]) -> Result<Self, PhysicsError> {
        let description: ModelDescription = serde_json::from_str(json)?;
        Self::from_description(description, motors)
    }

    /// Validates an already deserialized description.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::InvalidModel`] when the links and joints do not form a
    /// tree with a single fixed root or carry non-physical values, and
    /// [`PhysicsError::UnknownJoint`] when a motor names no joint.
    pub fn from_description(
        description: ModelDescription,
        motors: &[&str],
    ) -> Result<Self, PhysicsError> {
        let (mut links, link_index) = build_links(description.links)?;
        let mut joints = Vec::with_capacity(description.joints.len());
        for joint in description.joints {
            let index = joints.len();
            let joint = build_joint(joint, &link_index)?;
            if joints.iter().any(|j: &Joint| j.name == joint.name) {
                return Err(PhysicsError::InvalidModel(format!(
                    "joint `{}` is defined twice",
                    joint.name
                )));
            }
            if links[joint.child_link].parent_joint.replace(index).is_some() {
                return Err(PhysicsError::InvalidModel(format!(
                    "link `{}` has more than one parent joint",
                    links[joint.child_link].name
                )));
            }
            joints.push(joint);
        }

        let root = find_root(&links)?;
        let order = joint_order(root, &joints)?;
        for joint in &mut joints {
            joint.predecessor = links[joint.parent_link].parent_joint;
        }
        let motors = resolve_motors(&joints, motors)?;

        Ok(Self {
            name: description.name,
            source: None,
            links,
            joints,
            order,
            motors,
            sensors: Vec::new(),
            options: ModelOptions::default(),
            sensors_options: SensorsOptions::default(),
        })
    }

    /// Registers an encoder reading the position and velocity of `joint`.
    ///
    /// # Errors
    ///
    /// Fails on a sensor name already in use or a joint the model lacks.
    pub fn add_encoder_sensor(&mut self, name: &str, joint: &str) -> Result<(), PhysicsError> {
        if self.sensors.iter().any(|s| s.name == name) {
            return Err(PhysicsError::DuplicateSensor(name.to_string()));
        }
        let joint = self
            .joint_index(joint)
            .ok_or_else(|| PhysicsError::UnknownJoint(joint.to_string()))?;
        self.sensors.push(EncoderSensor { name: name.to_string(), joint });
        Ok(())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the model was loaded from, if any.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn nq(&self) -> usize {
        self.joints.len()
    }

    #[must_use]
    pub fn nv(&self) -> usize {
        self.joints.len()
    }

    #[must_use]
    pub fn nx(&self) -> usize {
        self.nq() + self.nv()
    }

    #[must_use]
    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }

    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.joints.iter().map(|j| j.name.as_str())
    }

    pub fn link_names(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(|l| l.name.as_str())
    }

    pub fn motor_names(&self) -> impl Iterator<Item = &str> {
        self.motors.iter().map(|&j| self.joints[j].name.as_str())
    }

    #[must_use]
    pub fn motor_count(&self) -> usize {
        self.motors.len()
    }

    pub fn sensor_names(&self) -> impl Iterator<Item = &str> {
        self.sensors.iter().map(|s| s.name.as_str())
    }

    #[must_use]
    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ModelOptions) {
        self.options = options;
    }

    #[must_use]
    pub fn sensors_options(&self) -> &SensorsOptions {
        &self.sensors_options
    }

    /// # Errors
    ///
    /// [`PhysicsError::InvalidOption`] on a negative noise level. The
    /// previous options stay in place.
    pub fn set_sensors_options(&mut self, options: SensorsOptions) -> Result<(), PhysicsError> {
        options.validate()?;
        self.sensors_options = options;
        Ok(())
    }

    /// Effort limit of each motor, `None` when unlimited.
    pub(crate) fn motor_limits(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.motors.iter().map(|&j| self.joints[j].effort)
    }
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn build_links(
    descriptions: Vec<LinkDescription>,
) -> Result<(Vec<Link>, HashMap<String, usize>), PhysicsError> {
    let mut link_index = HashMap::new();
    let mut links = Vec::with_capacity(descriptions.len());
    for link in descriptions {
        if !(non_negative(link.mass) && non_negative(link.inertia)) {
            return Err(PhysicsError::InvalidModel(format!(
                "link `{}` needs a finite, non-negative mass and inertia",
                link.name
            )));
        }
        if link_index.insert(link.name.clone(), links.len()).is_some() {
            return Err(PhysicsError::InvalidModel(format!(
                "link `{}` is defined twice",
                link.name
            )));
        }
        links.push(Link {
            name: link.name,
            mass: link.mass,
            inertia: link.inertia,
            com: Vec2::from_array(link.com),
            parent_joint: None,
        });
    }
    Ok((links, link_index))
}

fn build_joint(
    joint: JointDescription,
    link_index: &HashMap<String, usize>,
) -> Result<Joint, PhysicsError> {
    let lookup = |name: &str| {
        link_index.get(name).copied().ok_or_else(|| {
            PhysicsError::InvalidModel(format!(
                "joint `{}` refers to unknown link `{name}`",
                joint.name
            ))
        })
    };
    let parent_link = lookup(&joint.parent)?;
    let child_link = lookup(&joint.child)?;
    let kind = match joint.kind {
        JointKind::Prismatic { axis } => {
            let axis = Vec2::from_array(axis);
            let length = axis.length();
            if !(length.is_finite() && length > 0.0) {
                return Err(PhysicsError::InvalidModel(format!(
                    "prismatic joint `{}` needs a non-zero axis",
                    joint.name
                )));
            }
            JointType::Prismatic { axis: axis * length.recip() }
        }
        JointKind::Revolute { axis } => {
            if axis == 0.0 || !axis.is_finite() {
                return Err(PhysicsError::InvalidModel(format!(
                    "revolute joint `{}` needs a non-zero axis",
                    joint.name
                )));
            }
            JointType::Revolute { sign: axis.signum() }
        }
    };
    if joint.effort.is_some_and(|effort| effort.is_nan() || effort < 0.0) {
        return Err(PhysicsError::InvalidModel(format!(
            "joint `{}` has a negative effort limit",
            joint.name
        )));
    }
    if !non_negative(joint.damping) {
        return Err(PhysicsError::InvalidModel(format!(
            "joint `{}` has a negative damping",
            joint.name
        )));
    }
    Ok(Joint {
        name: joint.name,
        kind,
        parent_link,
        child_link,
        origin: Vec2::from_array(joint.origin),
        effort: joint.effort,
        damping: joint.damping,
        predecessor: None,
    })
}

fn find_root(links: &[Link]) -> Result<usize, PhysicsError> {
    let mut roots = links.iter().enumerate().filter(|(_, l)| l.parent_joint.is_none());
    match (roots.next(), roots.next()) {
        (Some((root, _)), None) => Ok(root),
        (None, _) => Err(PhysicsError::InvalidModel(
            "every link has a parent joint, there is no fixed root".into(),
        )),
        (Some(_), Some((_, extra))) => Err(PhysicsError::InvalidModel(format!(
            "link `{}` is a second root",
            extra.name
        ))),
    }
}

/// Breadth-first joint order from the root, parents first.
fn joint_order(root: usize, joints: &[Joint]) -> Result<Vec<usize>, PhysicsError> {
    let mut order = Vec::with_capacity(joints.len());
    let mut queue = VecDeque::from([root]);
    while let Some(link) = queue.pop_front() {
        for (index, joint) in joints.iter().enumerate() {
            if joint.parent_link == link {
                order.push(index);
                queue.push_back(joint.child_link);
            }
        }
    }
    if order.len() == joints.len() {
        Ok(order)
    } else {
        Err(PhysicsError::InvalidModel("joints form a cycle detached from the root".into()))
    }
}

fn resolve_motors(joints: &[Joint], motors: &[&str]) -> Result<Vec<usize>, PhysicsError> {
    let mut motor_joints = Vec::with_capacity(motors.len());
    for &name in motors {
        let joint = joints
            .iter()
            .position(|j| j.name == name)
            .ok_or_else(|| PhysicsError::UnknownJoint(name.to_string()))?;
        if motor_joints.contains(&joint) {
            return Err(PhysicsError::InvalidModel(format!("joint `{name}` is actuated twice")));
        }
        motor_joints.push(joint);
    }
    Ok(motor_joints)
}
