mod common;

use std::f64::consts::PI;

use approx::assert_relative_eq;
use envs::acrobot::SUCCESS_KEY;
use envs::{AcrobotConfig, AcrobotEnv, AcrobotGoalEnv, Env, EnvError, InfoValue, Space};

use common::ScriptedSimulator;

#[test]
fn construction_actuates_the_elbow() {
    let env = AcrobotEnv::new().unwrap();
    let model = env.simulator().model();
    assert_eq!(model.motor_names().collect::<Vec<_>>(), ["second_joint"]);
    assert_eq!(env.action_space(), &Space::Discrete(3));
    assert_eq!(env.simulator().options().stepper.controller_update_period, 0.05);
}

#[test]
fn reset_samples_near_hanging_rest() {
    let mut env = AcrobotEnv::new().unwrap();
    env.seed(Some(21));
    for _ in 0..20 {
        let observation = env.reset().unwrap();
        assert!(observation.iter().all(|value| value.abs() <= 0.1));
        assert!(env.observation_space().contains_point(&observation));
    }
}

#[test]
fn positive_action_torques_the_elbow_forward() {
    let mut env = AcrobotEnv::new().unwrap();
    let step = env.step(2).unwrap();
    assert!(step.observation[3] > 0.0);
    assert_eq!(step.reward, -1.0);
    assert!(!step.terminal);
    assert_eq!(env.simulator().latched_command(), &[1.0]);

    env.step(1).unwrap();
    assert_eq!(env.simulator().latched_command(), &[0.0]);
}

#[test]
fn out_of_range_action_is_rejected() {
    let mut env = AcrobotEnv::new().unwrap();
    let error = env.step(3).unwrap_err();
    assert!(matches!(error, EnvError::InvalidAction { action: 3, n: 3 }));
    assert_eq!(env.simulator().time(), 0.0);
}

#[test]
fn raised_tip_terminates_without_reward() {
    let simulator = ScriptedSimulator::scripted(&[
        [0.5, 0.0, 0.0, 0.0],
        [PI, 0.2, 0.0, 0.0],
        [PI, 0.2, 0.0, 0.0],
    ]);
    let mut env: AcrobotEnv<_> = AcrobotEnv::with_simulator(simulator, AcrobotConfig::default());
    env.reset().unwrap();

    let step = env.step(0).unwrap();
    assert!(!step.terminal);
    assert_eq!(step.reward, -1.0);

    let step = env.step(0).unwrap();
    assert!(step.terminal);
    assert_eq!(step.reward, 0.0);
    assert_eq!(env.steps_beyond_done(), Some(0));

    let step = env.step(0).unwrap();
    assert_eq!(step.reward, 0.0);
    assert_eq!(env.steps_beyond_done(), Some(1));
}

#[test]
fn observation_wraps_angles() {
    let simulator = ScriptedSimulator::scripted(&[[3.0 * PI / 2.0, -3.0 * PI / 2.0, 1.0, 2.0]]);
    let mut env: AcrobotEnv<_> = AcrobotEnv::with_simulator(simulator, AcrobotConfig::default());
    let step = env.step(1).unwrap();
    assert_relative_eq!(step.observation[0], -PI / 2.0, epsilon = 1e-12);
    assert_relative_eq!(step.observation[1], PI / 2.0, epsilon = 1e-12);
    assert_eq!(&step.observation[2..], &[1.0, 2.0]);
}

#[test]
fn continuous_torque_is_clipped_to_the_motor_range() {
    let mut env = AcrobotEnv::continuous().unwrap();
    assert_eq!(env.action_space(), &Space::symmetric(&[1.0]));

    env.step(5.0).unwrap();
    assert_eq!(env.simulator().latched_command(), &[1.0]);
    env.step(-0.3).unwrap();
    assert_eq!(env.simulator().latched_command(), &[-0.3]);
    env.step(-8.0).unwrap();
    assert_eq!(env.simulator().latched_command(), &[-1.0]);
}

#[test]
fn non_finite_torque_is_rejected() {
    let mut env = AcrobotEnv::continuous().unwrap();
    let error = env.step(f64::NAN).unwrap_err();
    assert!(matches!(error, EnvError::NonFiniteAction(_)));
    assert_eq!(env.simulator().time(), 0.0);
}

#[test]
fn goal_env_samples_a_goal_per_episode() {
    let mut env = AcrobotGoalEnv::new(AcrobotEnv::new().unwrap());
    let mut replay = AcrobotGoalEnv::new(AcrobotEnv::new().unwrap());
    env.seed(Some(3));
    replay.seed(Some(3));
    assert_eq!(env.observation_space().size(), 6);

    let (low, high) = env.goal_range();
    assert_relative_eq!(low, 0.0);
    assert_relative_eq!(high, 0.95 * 2.0);

    let first = env.reset().unwrap();
    assert_eq!(replay.reset().unwrap(), first);
    let second = env.reset().unwrap();
    for observation in [first, second] {
        assert!((low..=high).contains(&observation.desired_goal));
        assert!(env.observation_space().contains_point(&observation.to_array()));
    }
    assert_ne!(first.desired_goal, second.desired_goal);
    assert_relative_eq!(env.desired_goal(), second.desired_goal);
}

#[test]
fn forced_goal_drives_success_and_termination() {
    let simulator = ScriptedSimulator::scripted(&[
        [0.5, 0.0, 0.0, 0.0],
        [PI, 0.2, 0.0, 0.0],
    ]);
    let inner: AcrobotEnv<_> = AcrobotEnv::with_simulator(simulator, AcrobotConfig::default());
    let mut env = AcrobotGoalEnv::new(inner);
    env.reset().unwrap();
    env.set_desired_goal(1.5).unwrap();
    assert_relative_eq!(env.observation().desired_goal, 1.5);

    let step = env.step(1).unwrap();
    assert!(!step.terminal);
    assert_eq!(step.reward, -1.0);
    assert_eq!(step.info.get(SUCCESS_KEY), Some(&InfoValue::Bool(false)));
    assert_relative_eq!(step.observation.achieved_goal, -2.0 * 0.5_f64.cos(), epsilon = 1e-12);

    let step = env.step(1).unwrap();
    assert!(step.terminal);
    assert_eq!(step.reward, 0.0);
    assert_eq!(step.info.get(SUCCESS_KEY), Some(&InfoValue::Bool(true)));
    assert_relative_eq!(step.observation.achieved_goal, 1.0 + 0.2_f64.cos(), epsilon = 1e-12);
}

#[test]
fn unreachable_goals_are_rejected() {
    let mut env = AcrobotGoalEnv::new(AcrobotEnv::new().unwrap());
    assert!(matches!(env.set_desired_goal(2.5), Err(EnvError::InvalidGoal { .. })));
    assert!(matches!(env.set_goal_range(1.0, 0.5), Err(EnvError::InvalidGoalRange { .. })));
    assert!(matches!(env.set_goal_range(0.0, 3.0), Err(EnvError::InvalidGoalRange { .. })));
    env.set_goal_range(1.2, 1.2).unwrap();
    env.seed(Some(1));
    assert_relative_eq!(env.reset().unwrap().desired_goal, 1.2);
}
