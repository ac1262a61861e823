//! # Articulated Dynamics
//!
//! Equations of motion of a planar tree of links, `M(q) q̈ + h(q, v) = τ`.
//!
//! The mass matrix is assembled from the Jacobian of each link's centre of
//! mass, `M = Σ m Jvᵀ Jv + I Jωᵀ Jω`. The bias term projects the
//! velocity-product acceleration of each centre of mass (the acceleration it
//! would have with `q̈ = 0`) minus gravity through the same Jacobians.

use crate::error::PhysicsError;
use crate::model::{JointType, Model};
use crate::types::{cross, Vec2};

/// Pose and motion of a link frame in the world.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LinkFrame {
    pub origin: Vec2,
    pub angle: f64,
    pub velocity: Vec2,
    pub omega: f64,
    /// Acceleration of the origin when every joint acceleration is zero.
    pub bias: Vec2,
}

/// Walks the joint tree from the root. The root frame stays at rest.
pub(crate) fn forward_kinematics(model: &Model, q: &[f64], v: &[f64]) -> Vec<LinkFrame> {
    let mut frames = vec![LinkFrame::default(); model.links.len()];
    for &j in &model.order {
        let joint = &model.joints[j];
        let parent = frames[joint.parent_link];
        let mut child = parent;
        let spin_squared = parent.omega * parent.omega;
        match joint.kind {
            JointType::Prismatic { axis } => {
                let offset = (joint.origin + axis * q[j]).rotate(parent.angle);
                let slide = axis.rotate(parent.angle) * v[j];
                child.origin = parent.origin + offset;
                child.velocity = parent.velocity + cross(parent.omega, offset) + slide;
                child.bias =
                    parent.bias - offset * spin_squared + cross(parent.omega, slide) * 2.0;
            }
            JointType::Revolute { sign } => {
                let offset = joint.origin.rotate(parent.angle);
                child.origin = parent.origin + offset;
                child.velocity = parent.velocity + cross(parent.omega, offset);
                child.bias = parent.bias - offset * spin_squared;
                child.angle = parent.angle + sign * q[j];
                child.omega = parent.omega + sign * v[j];
            }
        }
        frames[joint.child_link] = child;
    }
    frames
}

/// World position of the centre of mass of `link`.
pub(crate) fn com_position(model: &Model, frames: &[LinkFrame], link: usize) -> Vec2 {
    let frame = &frames[link];
    frame.origin + model.links[link].com.rotate(frame.angle)
}

/// One Jacobian column: generalized coordinate, linear part, angular part.
type Column = (usize, Vec2, f64);

fn com_jacobian(model: &Model, frames: &[LinkFrame], link: usize, com: Vec2) -> Vec<Column> {
    let mut columns = Vec::new();
    let mut next = model.links[link].parent_joint;
    while let Some(j) = next {
        let joint = &model.joints[j];
        let column = match joint.kind {
            JointType::Prismatic { axis } => {
                (j, axis.rotate(frames[joint.parent_link].angle), 0.0)
            }
            JointType::Revolute { sign } => {
                let pivot = frames[joint.child_link].origin;
                (j, cross(sign, com - pivot), sign)
            }
        };
        columns.push(column);
        next = joint.predecessor;
    }
    columns
}

/// Solves the forward dynamics for the joint accelerations.
///
/// `tau` holds one generalized force per joint. Joint damping is applied here.
pub(crate) fn acceleration(
    model: &Model,
    gravity: Vec2,
    q: &[f64],
    v: &[f64],
    tau: &[f64],
) -> Result<Vec<f64>, PhysicsError> {
    let n = model.nv();
    let frames = forward_kinematics(model, q, v);
    let mut mass = vec![0.0; n * n];
    let mut rhs: Vec<f64> = model
        .joints
        .iter()
        .zip(tau.iter().zip(v))
        .map(|(joint, (&tau, &v))| tau - joint.damping * v)
        .collect();

    for (index, link) in model.links.iter().enumerate() {
        if link.parent_joint.is_none() {
            continue;
        }
        let frame = &frames[index];
        let com = com_position(model, &frames, index);
        let lever = com - frame.origin;
        let com_bias = frame.bias - lever * (frame.omega * frame.omega);
        let columns = com_jacobian(model, &frames, index, com);
        for &(row, linear_row, angular_row) in &columns {
            rhs[row] -= link.mass * linear_row.dot(com_bias - gravity);
            for &(col, linear_col, angular_col) in &columns {
                mass[row * n + col] += link.mass * linear_row.dot(linear_col)
                    + link.inertia * angular_row * angular_col;
            }
        }
    }

    cholesky_solve(&mut mass, n, &mut rhs)?;
    Ok(rhs)
}

/// Kinetic plus potential energy, zero potential at the root height.
pub(crate) fn energy(model: &Model, gravity: Vec2, q: &[f64], v: &[f64]) -> f64 {
    let frames = forward_kinematics(model, q, v);
    let mut total = 0.0;
    for (index, link) in model.links.iter().enumerate() {
        if link.parent_joint.is_none() {
            continue;
        }
        let frame = &frames[index];
        let com = com_position(model, &frames, index);
        let velocity = frame.velocity + cross(frame.omega, com - frame.origin);
        total += 0.5 * link.mass * velocity.length_squared()
            + 0.5 * link.inertia * frame.omega * frame.omega
            - link.mass * gravity.dot(com);
    }
    total
}

/// Solves `A x = b` in place for a symmetric positive definite `A`.
fn cholesky_solve(a: &mut [f64], n: usize, b: &mut [f64]) -> Result<(), PhysicsError> {
    const PIVOT_EPS: f64 = 1e-12;
    // Lower factor overwrites the lower triangle of `a`.
    for j in 0..n {
        let mut diagonal = a[j * n + j];
        for k in 0..j {
            diagonal -= a[j * n + k] * a[j * n + k];
        }
        if diagonal.is_nan() || diagonal <= PIVOT_EPS {
            return Err(PhysicsError::SingularMassMatrix);
        }
        let diagonal = diagonal.sqrt();
        a[j * n + j] = diagonal;
        for i in (j + 1)..n {
            let mut value = a[i * n + j];
            for k in 0..j {
                value -= a[i * n + k] * a[j * n + k];
            }
            a[i * n + j] = value / diagonal;
        }
    }
    for i in 0..n {
        let mut value = b[i];
        for k in 0..i {
            value -= a[i * n + k] * b[k];
        }
        b[i] = value / a[i * n + i];
    }
    for i in (0..n).rev() {
        let mut value = b[i];
        for k in (i + 1)..n {
            value -= a[k * n + i] * b[k];
        }
        b[i] = value / a[i * n + i];
    }
    Ok(())
}
