mod common;

use envs::{CartPoleConfig, CartPoleEnv, Env, InfoValue, TimeLimit, TRUNCATED_KEY};

use common::ScriptedSimulator;

fn capped(simulator: ScriptedSimulator, cap: usize) -> TimeLimit<CartPoleEnv<ScriptedSimulator>> {
    TimeLimit::new(CartPoleEnv::with_simulator(simulator, CartPoleConfig::default()), cap)
}

#[test]
fn cap_truncates_the_episode() {
    let mut env = capped(ScriptedSimulator::new(0.0), 3);
    env.reset().unwrap();
    for _ in 0..2 {
        let step = env.step(1).unwrap();
        assert!(!step.terminal);
        assert!(step.info.is_empty());
    }
    let step = env.step(1).unwrap();
    assert!(step.terminal);
    assert_eq!(step.reward, 1.0);
    assert_eq!(step.info.get(TRUNCATED_KEY), Some(&InfoValue::Bool(true)));
    assert_eq!(env.elapsed_steps(), 3);

    env.reset().unwrap();
    assert_eq!(env.elapsed_steps(), 0);
    assert!(!env.step(1).unwrap().terminal);
}

#[test]
fn task_termination_on_the_cap_is_not_truncation() {
    let mut env = capped(
        ScriptedSimulator::scripted(&[[0.0; 4], [1.0, 0.0, 0.0, 0.0]]),
        2,
    );
    env.step(1).unwrap();
    let step = env.step(1).unwrap();
    assert!(step.terminal);
    assert_eq!(step.info.get(TRUNCATED_KEY), Some(&InfoValue::Bool(false)));
}

#[test]
fn wrapper_forwards_the_contract() {
    let mut env = capped(ScriptedSimulator::new(0.0), envs::cartpole::MAX_EPISODE_STEPS);
    assert_eq!(env.max_episode_steps(), 200);
    assert_eq!(env.seed(Some(13)), 13);
    assert_eq!(env.inner().simulator().seeds.last(), Some(&13));
    assert_eq!(env.action_space().size(), 2);
    env.close();
    assert_eq!(env.inner_mut().simulator_mut().closes, 1);
}
