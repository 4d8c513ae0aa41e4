//! Unit tests for evo-fsm.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use evo_core::WorkerPool;
use parking_lot::Mutex;

use crate::{ActionBatch, Behaviour, BehaviourParams, FlagSender, Fsm, StagedExecutor};

crate::fsm_enum! {
    enum State { Idle, Walk, Run, Rest }
}

crate::fsm_enum! {
    enum Flag { Go, Faster, Stop, Tired }
}

type Log = Arc<Mutex<Vec<String>>>;

fn pool() -> WorkerPool {
    WorkerPool::new(4).expect("pool should build")
}

fn executor() -> StagedExecutor {
    StagedExecutor::new(pool())
}

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

/// Behaviour that logs every hook and optionally raises a flag on tick.
struct Recorder {
    name:        &'static str,
    log:         Log,
    raise:       Option<Flag>,
    from_worker: bool,
}

impl Recorder {
    fn new(name: &'static str, log: &Log) -> Self {
        Self { name, log: Arc::clone(log), raise: None, from_worker: false }
    }

    fn raising(mut self, flag: Flag, from_worker: bool) -> Self {
        self.raise = Some(flag);
        self.from_worker = from_worker;
        self
    }

    fn logged(&self, hook: &'static str) -> impl FnOnce() + Send + '_ {
        let entry = format!("{}:{hook}", self.name);
        move || self.log.lock().push(entry)
    }
}

impl Behaviour<Flag> for Recorder {
    type Params = ();

    fn on_tick(&self, _params: Option<()>, flags: &FlagSender<Flag>) -> ActionBatch<'_> {
        let mut batch = ActionBatch::new().main_thread(0, self.logged("tick"));
        if let Some(flag) = self.raise {
            let flags = flags.clone();
            if self.from_worker {
                batch.push_multi_thread(0, move || {
                    flags.raise(flag);
                });
            } else {
                batch = batch.on_complete(move || {
                    flags.raise(flag);
                });
            }
        }
        batch
    }

    fn on_enter(&self, _params: Option<()>, _flags: &FlagSender<Flag>) -> ActionBatch<'_> {
        ActionBatch::new().multi_thread(0, self.logged("enter"))
    }

    fn on_exit(&self, _params: Option<()>, _flags: &FlagSender<Flag>) -> ActionBatch<'_> {
        ActionBatch::new().multi_thread(0, self.logged("exit"))
    }
}

// ── ActionBatch ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod batch_tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let batch = ActionBatch::default();
        assert!(batch.is_empty());
        assert_eq!(batch.rung_count(), 0);
        assert_eq!(batch.action_count(), 0);
    }

    #[test]
    fn transition_only_is_not_empty() {
        let batch = ActionBatch::new().on_complete(|| {});
        assert!(!batch.is_empty());
        assert!(batch.has_transition());
    }

    #[test]
    fn counts_span_both_lanes() {
        let batch = ActionBatch::new()
            .main_thread(0, || {})
            .main_thread(0, || {})
            .multi_thread(0, || {})
            .multi_thread(3, || {})
            .main_thread(7, || {});
        assert_eq!(batch.rung_count(), 3);
        assert_eq!(batch.action_count(), 5);
    }

    #[test]
    fn pop_rung_yields_ascending_union() {
        let mut batch = ActionBatch::new()
            .multi_thread(5, || {})
            .main_thread(2, || {})
            .multi_thread(2, || {})
            .main_thread(9, || {});
        let order: Vec<_> = std::iter::from_fn(|| batch.pop_rung().map(|s| s.rung)).collect();
        assert_eq!(order, vec![2, 5, 9]);
        assert!(batch.pop_rung().is_none());
    }
}

// ── StagedExecutor ────────────────────────────────────────────────────────────

#[cfg(test)]
mod executor_tests {
    use std::thread;
    use std::time::Duration;

    use evo_core::{EntityId, EntityRng, SimRng};

    use super::*;
    use crate::BatchError;

    #[test]
    fn empty_batch_short_circuits() {
        let report = executor().execute(ActionBatch::default()).unwrap();
        assert_eq!(report.rungs, 0);
        assert_eq!(report.actions, 0);
        assert!(!report.transition_ran);
    }

    #[test]
    fn main_thread_lane_runs_in_order_on_caller() {
        let caller = thread::current().id();
        let seen = Mutex::new(Vec::new());
        let batch = ActionBatch::new()
            .main_thread(0, || seen.lock().push((1, thread::current().id())))
            .main_thread(0, || seen.lock().push((2, thread::current().id())))
            .main_thread(0, || seen.lock().push((3, thread::current().id())));
        executor().execute(batch).unwrap();

        let seen = seen.into_inner();
        assert_eq!(seen.iter().map(|(n, _)| *n).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(seen.iter().all(|(_, id)| *id == caller));
    }

    #[test]
    fn transition_runs_once_after_every_rung() {
        let counter = AtomicUsize::new(0);
        let at_transition = AtomicUsize::new(usize::MAX);
        let transitions = AtomicUsize::new(0);
        let mut batch = ActionBatch::new();
        for rung in 0..3 {
            for _ in 0..10 {
                batch.push_multi_thread(rung, || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
            batch.push_main_thread(rung, || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        let batch = batch.on_complete(|| {
            at_transition.store(counter.load(Ordering::SeqCst), Ordering::SeqCst);
            transitions.fetch_add(1, Ordering::SeqCst);
        });

        let report = executor().execute(batch).unwrap();
        assert_eq!(report.rungs, 3);
        assert_eq!(report.actions, 33);
        assert!(report.transition_ran);
        assert_eq!(transitions.load(Ordering::SeqCst), 1);
        assert_eq!(at_transition.load(Ordering::SeqCst), 33);
    }

    /// Every action records a (rung, start, end) stamp from one global
    /// sequence; all of rung k must end before any of rung k + 1 starts.
    #[test]
    fn rungs_are_fully_retired_before_the_next_starts() {
        let executor = executor();
        let mut seeds = SimRng::new(2024);

        for run in 0..40 {
            let clock = AtomicUsize::new(0);
            let stamps: Mutex<Vec<(u32, usize, usize)>> = Mutex::new(Vec::new());
            let mut rng = EntityRng::new(seeds.random(), EntityId(run));
            let mut batch = ActionBatch::new();

            for rung in 0..3u32 {
                for _ in 0..rng.gen_range(1..8) {
                    let sleep = Duration::from_micros(rng.gen_range(0..400));
                    let (clock, stamps) = (&clock, &stamps);
                    batch.push_multi_thread(rung, move || {
                        let start = clock.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(sleep);
                        let end = clock.fetch_add(1, Ordering::SeqCst);
                        stamps.lock().push((rung, start, end));
                    });
                }
                for _ in 0..rng.gen_range(0..3) {
                    let sleep = Duration::from_micros(rng.gen_range(0..400));
                    let (clock, stamps) = (&clock, &stamps);
                    batch.push_main_thread(rung, move || {
                        let start = clock.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(sleep);
                        let end = clock.fetch_add(1, Ordering::SeqCst);
                        stamps.lock().push((rung, start, end));
                    });
                }
            }

            executor.execute(batch).unwrap();
            let stamps = stamps.into_inner();

            for rung in 0..2u32 {
                let last_end = stamps.iter().filter(|s| s.0 == rung).map(|s| s.2).max().unwrap();
                let next_start = stamps.iter().filter(|s| s.0 == rung + 1).map(|s| s.1).min().unwrap();
                assert!(
                    last_end < next_start,
                    "run {run}: rung {} started at {next_start} before rung {rung} ended at {last_end}",
                    rung + 1
                );
            }
        }
    }

    #[test]
    fn multi_thread_lane_overlaps_main_thread_lane() {
        // A worker action waits for the main-thread action of the same rung
        // to signal; this only terminates if both lanes run concurrently.
        let signal = AtomicUsize::new(0);
        let batch = ActionBatch::new()
            .multi_thread(0, || {
                while signal.load(Ordering::SeqCst) == 0 {
                    std::hint::spin_loop();
                }
            })
            .main_thread(0, || signal.store(1, Ordering::SeqCst));
        executor().execute(batch).unwrap();
    }

    #[test]
    fn overrunning_rung_completes_and_stops_the_batch() {
        let executor = executor().with_rung_deadline(Duration::from_millis(5));
        let finished = AtomicUsize::new(0);
        let later = AtomicUsize::new(0);
        let transitioned = AtomicUsize::new(0);

        let batch = ActionBatch::new()
            .multi_thread(0, || {
                thread::sleep(Duration::from_millis(30));
                finished.fetch_add(1, Ordering::SeqCst);
            })
            .multi_thread(0, || {
                finished.fetch_add(1, Ordering::SeqCst);
            })
            .multi_thread(1, || {
                later.fetch_add(1, Ordering::SeqCst);
            })
            .main_thread(2, || {
                later.fetch_add(1, Ordering::SeqCst);
            })
            .on_complete(|| {
                transitioned.fetch_add(1, Ordering::SeqCst);
            });

        let err = executor.execute(batch).unwrap_err();
        match err {
            BatchError::RungDeadlineExceeded { rung, skipped_rungs, .. } => {
                assert_eq!(rung, 0);
                assert_eq!(skipped_rungs, 2);
            }
        }
        // The overrunning rung was not cut short.
        assert_eq!(finished.load(Ordering::SeqCst), 2);
        assert_eq!(later.load(Ordering::SeqCst), 0);
        assert_eq!(transitioned.load(Ordering::SeqCst), 0);
    }
}

// ── FlagSender ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod flag_tests {
    use super::*;
    use crate::{FsmEnum, NoopBehaviour};

    #[test]
    fn first_raised_flag_wins() {
        let fsm: Fsm<State, Flag> = Fsm::new(executor());
        let flags = fsm.flag_sender();
        assert!(flags.raise(Flag::Go));
        assert!(!flags.raise(Flag::Stop));
        assert_eq!(flags.pending(), Some(Flag::Go));
    }

    #[test]
    fn racing_threads_leave_one_pending_flag() {
        let flags: FlagSender<Flag> = FlagSender::new();
        let accepted = AtomicUsize::new(0);
        std::thread::scope(|s| {
            for i in 0..16 {
                let (flags, accepted) = (flags.clone(), &accepted);
                s.spawn(move || {
                    let flag = Flag::from_index(i % Flag::COUNT).unwrap();
                    if flags.raise(flag) {
                        accepted.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
        assert!(flags.pending().is_some());
    }

    #[test]
    fn concurrent_worker_raises_fire_exactly_one_transition() {
        /// Every worker action of rung 0 raises a different flag.
        struct Scatter;
        impl Behaviour<Flag> for Scatter {
            type Params = ();
            fn on_tick(&self, _p: Option<()>, flags: &FlagSender<Flag>) -> ActionBatch<'_> {
                let mut batch = ActionBatch::new();
                for i in 0..12 {
                    let flags = flags.clone();
                    batch.push_multi_thread(0, move || {
                        if let Some(flag) = Flag::from_index(i % Flag::COUNT) {
                            flags.raise(flag);
                        }
                    });
                }
                batch
            }
        }

        let raised = [Flag::Go, Flag::Faster, Flag::Stop, Flag::Tired];
        for run in 0..40 {
            let mut fsm: Fsm<State, Flag> = Fsm::new(executor());
            fsm.add_behaviour_instance(State::Idle, Scatter, BehaviourParams::none());
            fsm.add_behaviour::<NoopBehaviour>(State::Walk, BehaviourParams::none());
            fsm.add_behaviour::<NoopBehaviour>(State::Run, BehaviourParams::none());
            fsm.add_behaviour::<NoopBehaviour>(State::Rest, BehaviourParams::none());
            fsm.set_transition(State::Idle, Flag::Go, State::Walk);
            fsm.set_transition(State::Idle, Flag::Faster, State::Run);
            fsm.set_transition(State::Idle, Flag::Stop, State::Rest);
            fsm.set_transition(State::Idle, Flag::Tired, State::Rest);
            fsm.force_transition(State::Idle);

            let fired = fsm.tick().unwrap();
            assert_eq!(fired.len(), 1, "run {run}: {fired:?}");
            let record = fired[0];
            assert!(raised.contains(&record.flag), "run {run}");
            assert_eq!(Some(record.to), fsm.transition_target(State::Idle, record.flag));
            assert_eq!(fsm.current_state(), Some(record.to));
            assert_eq!(fsm.flag_sender().pending(), None, "run {run}");
        }
    }
}

// ── Fsm ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod fsm_tests {
    use super::*;
    use crate::{FsmEnum, FsmError, NoopBehaviour, TransitionRecord};

    #[test]
    fn enum_indices_are_dense() {
        assert_eq!(State::COUNT, 4);
        assert_eq!(Flag::COUNT, 4);
        for i in 0..State::COUNT {
            assert_eq!(State::from_index(i).unwrap().index(), i);
        }
        assert_eq!(State::from_index(4), None);
        assert_eq!(Flag::Tired.name(), "Tired");
    }

    #[test]
    fn unplaced_machine_ticks_as_noop() {
        let log = new_log();
        let mut fsm: Fsm<State, Flag> = Fsm::new(executor());
        fsm.add_behaviour_instance(State::Idle, Recorder::new("idle", &log), BehaviourParams::none());
        assert!(fsm.tick().unwrap().is_empty());
        assert!(log.lock().is_empty());
        assert_eq!(fsm.current_state(), None);
    }

    #[test]
    fn state_without_behaviour_ticks_as_noop() {
        let mut fsm: Fsm<State, Flag> = Fsm::new(executor());
        fsm.force_transition(State::Run);
        assert!(fsm.tick().unwrap().is_empty());
        assert_eq!(fsm.current_state(), Some(State::Run));
    }

    #[test]
    fn force_transition_skips_hooks() {
        let log = new_log();
        let mut fsm: Fsm<State, Flag> = Fsm::new(executor());
        fsm.add_behaviour_instance(State::Idle, Recorder::new("idle", &log), BehaviourParams::none());
        fsm.force_transition(State::Idle);
        assert_eq!(fsm.current_state(), Some(State::Idle));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn flag_raised_in_tick_moves_state_exit_before_enter() {
        let log = new_log();
        let side_effect_log = Arc::clone(&log);
        let mut fsm: Fsm<State, Flag> = Fsm::new(executor());
        fsm.add_behaviour_instance(
            State::Idle,
            Recorder::new("idle", &log).raising(Flag::Go, false),
            BehaviourParams::none(),
        );
        fsm.add_behaviour_instance(State::Walk, Recorder::new("walk", &log), BehaviourParams::none());
        fsm.set_transition_with(State::Idle, Flag::Go, State::Walk, move || {
            side_effect_log.lock().push("side-effect".into());
        });
        fsm.force_transition(State::Idle);

        let fired = fsm.tick().unwrap();

        assert_eq!(fired, vec![TransitionRecord { from: State::Idle, flag: Flag::Go, to: State::Walk }]);
        assert_eq!(fsm.current_state(), Some(State::Walk));
        assert_eq!(*log.lock(), vec!["idle:tick", "idle:exit", "side-effect", "walk:enter"]);
    }

    #[test]
    fn flag_raised_from_worker_rung_is_applied_after_batch() {
        let log = new_log();
        let mut fsm: Fsm<State, Flag> = Fsm::new(executor());
        fsm.add_behaviour_instance(
            State::Walk,
            Recorder::new("walk", &log).raising(Flag::Faster, true),
            BehaviourParams::none(),
        );
        fsm.add_behaviour_instance(State::Run, Recorder::new("run", &log), BehaviourParams::none());
        fsm.set_transition(State::Walk, Flag::Faster, State::Run);
        fsm.force_transition(State::Walk);

        let fired = fsm.tick().unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fsm.current_state(), Some(State::Run));
        assert_eq!(*log.lock(), vec!["walk:tick", "walk:exit", "run:enter"]);
        assert_eq!(fsm.flag_sender().pending(), None);
    }

    #[test]
    fn unassigned_flag_is_noop() {
        let log = new_log();
        let mut fsm: Fsm<State, Flag> = Fsm::new(executor());
        fsm.add_behaviour_instance(
            State::Idle,
            Recorder::new("idle", &log).raising(Flag::Stop, false),
            BehaviourParams::none(),
        );
        fsm.force_transition(State::Idle);
        assert!(fsm.tick().unwrap().is_empty());
        assert!(fsm.transition(Flag::Faster).unwrap().is_empty());
        assert_eq!(fsm.current_state(), Some(State::Idle));
        assert_eq!(*log.lock(), vec!["idle:tick"]);
    }

    #[test]
    fn terminal_state_is_stasis() {
        let mut fsm: Fsm<State, Flag> = Fsm::new(executor());
        fsm.add_behaviour::<NoopBehaviour>(State::Rest, BehaviourParams::none());
        fsm.force_transition(State::Rest);
        for flag in [Flag::Go, Flag::Faster, Flag::Stop, Flag::Tired] {
            assert!(fsm.transition(flag).unwrap().is_empty());
        }
        assert_eq!(fsm.current_state(), Some(State::Rest));
    }

    #[test]
    fn second_add_behaviour_is_noop() {
        let log = new_log();
        let mut fsm: Fsm<State, Flag> = Fsm::new(executor());
        assert!(fsm.add_behaviour_instance(State::Idle, Recorder::new("first", &log), BehaviourParams::none()));
        assert!(!fsm.add_behaviour_instance(State::Idle, Recorder::new("second", &log), BehaviourParams::none()));
        assert!(!fsm.add_behaviour::<NoopBehaviour>(State::Idle, BehaviourParams::none()));
        fsm.force_transition(State::Idle);
        fsm.tick().unwrap();
        assert_eq!(*log.lock(), vec!["first:tick"]);
    }

    #[test]
    fn set_transition_overwrites_cell() {
        let mut fsm: Fsm<State, Flag> = Fsm::new(executor());
        fsm.set_transition(State::Idle, Flag::Go, State::Walk);
        fsm.set_transition(State::Idle, Flag::Go, State::Run);
        assert_eq!(fsm.transition_target(State::Idle, Flag::Go), Some(State::Run));
        assert_eq!(fsm.transition_target(State::Idle, Flag::Stop), None);

        fsm.force_transition(State::Idle);
        fsm.transition(Flag::Go).unwrap();
        assert_eq!(fsm.current_state(), Some(State::Run));
    }

    #[test]
    fn flags_from_enter_batches_chain() {
        struct Relay(Flag);
        impl Behaviour<Flag> for Relay {
            type Params = ();
            fn on_tick(&self, _p: Option<()>, _f: &FlagSender<Flag>) -> ActionBatch<'_> {
                ActionBatch::default()
            }
            fn on_enter(&self, _p: Option<()>, flags: &FlagSender<Flag>) -> ActionBatch<'_> {
                let flags = flags.clone();
                let flag = self.0;
                ActionBatch::new().multi_thread(0, move || {
                    flags.raise(flag);
                })
            }
        }

        let mut fsm: Fsm<State, Flag> = Fsm::new(executor());
        fsm.add_behaviour_instance(State::Walk, Relay(Flag::Faster), BehaviourParams::none());
        fsm.add_behaviour::<NoopBehaviour>(State::Run, BehaviourParams::none());
        fsm.set_transition(State::Idle, Flag::Go, State::Walk);
        fsm.set_transition(State::Walk, Flag::Faster, State::Run);
        fsm.force_transition(State::Idle);

        let fired = fsm.transition(Flag::Go).unwrap();
        assert_eq!(fired.iter().map(|r| r.to).collect::<Vec<_>>(), vec![State::Walk, State::Run]);
        assert_eq!(fsm.current_state(), Some(State::Run));
    }

    #[test]
    fn endless_chain_is_cut_off() {
        struct Bounce;
        impl Behaviour<Flag> for Bounce {
            type Params = ();
            fn on_tick(&self, _p: Option<()>, _f: &FlagSender<Flag>) -> ActionBatch<'_> {
                ActionBatch::default()
            }
            fn on_enter(&self, _p: Option<()>, flags: &FlagSender<Flag>) -> ActionBatch<'_> {
                let flags = flags.clone();
                ActionBatch::new().main_thread(0, move || {
                    flags.raise(Flag::Tired);
                })
            }
        }

        let mut fsm: Fsm<State, Flag> = Fsm::new(executor()).with_max_chained_transitions(4);
        fsm.add_behaviour::<NoopBehaviour>(State::Idle, BehaviourParams::none());
        fsm.add_behaviour_instance(State::Walk, Bounce, BehaviourParams::none());
        fsm.add_behaviour_instance(State::Rest, Bounce, BehaviourParams::none());
        fsm.set_transition(State::Idle, Flag::Go, State::Walk);
        fsm.set_transition(State::Walk, Flag::Tired, State::Rest);
        fsm.set_transition(State::Rest, Flag::Tired, State::Walk);
        fsm.force_transition(State::Idle);

        let err = fsm.transition(Flag::Go).unwrap_err();
        assert!(matches!(err, FsmError::TransitionChainTooLong { limit: 4 }));
    }

    #[test]
    fn default_chain_limit_follows_config() {
        struct Loop;
        impl Behaviour<Flag> for Loop {
            type Params = ();
            fn on_tick(&self, _p: Option<()>, _f: &FlagSender<Flag>) -> ActionBatch<'_> {
                ActionBatch::default()
            }
            fn on_enter(&self, _p: Option<()>, flags: &FlagSender<Flag>) -> ActionBatch<'_> {
                let flags = flags.clone();
                ActionBatch::new().on_complete(move || {
                    flags.raise(Flag::Go);
                })
            }
        }

        let mut fsm: Fsm<State, Flag> = Fsm::new(executor());
        fsm.add_behaviour_instance(State::Walk, Loop, BehaviourParams::none());
        fsm.add_behaviour_instance(State::Run, Loop, BehaviourParams::none());
        fsm.set_transition(State::Walk, Flag::Go, State::Run);
        fsm.set_transition(State::Run, Flag::Go, State::Walk);
        fsm.force_transition(State::Walk);

        let expected = evo_core::EcsConfig::default().max_chained_transitions;
        match fsm.transition(Flag::Go).unwrap_err() {
            FsmError::TransitionChainTooLong { limit } => assert_eq!(limit, expected),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn param_factories_feed_each_call_site() {
        struct Echo(Log);
        impl Behaviour<Flag> for Echo {
            type Params = &'static str;
            fn on_tick(&self, p: Option<&'static str>, _f: &FlagSender<Flag>) -> ActionBatch<'_> {
                ActionBatch::new().main_thread(0, move || self.0.lock().push(format!("tick:{p:?}")))
            }
            fn on_enter(&self, p: Option<&'static str>, _f: &FlagSender<Flag>) -> ActionBatch<'_> {
                ActionBatch::new().main_thread(0, move || self.0.lock().push(format!("enter:{p:?}")))
            }
            fn on_exit(&self, p: Option<&'static str>, _f: &FlagSender<Flag>) -> ActionBatch<'_> {
                ActionBatch::new().main_thread(0, move || self.0.lock().push(format!("exit:{p:?}")))
            }
        }

        let log = new_log();
        let mut fsm: Fsm<State, Flag> = Fsm::new(executor());
        fsm.add_behaviour_instance(
            State::Walk,
            Echo(Arc::clone(&log)),
            BehaviourParams::none().tick(|| Some("t")).enter(|| Some("e")),
        );
        fsm.add_behaviour::<NoopBehaviour>(State::Rest, BehaviourParams::none());
        fsm.set_transition(State::Idle, Flag::Go, State::Walk);
        fsm.set_transition(State::Walk, Flag::Stop, State::Rest);
        fsm.force_transition(State::Idle);

        fsm.transition(Flag::Go).unwrap();
        fsm.tick().unwrap();
        fsm.transition(Flag::Stop).unwrap();

        assert_eq!(
            *log.lock(),
            vec![r#"enter:Some("e")"#, r#"tick:Some("t")"#, "exit:None"]
        );
    }

    #[test]
    fn failed_exit_batch_leaves_state_unchanged() {
        use std::time::Duration;

        struct SlowExit;
        impl Behaviour<Flag> for SlowExit {
            type Params = ();
            fn on_tick(&self, _p: Option<()>, _f: &FlagSender<Flag>) -> ActionBatch<'_> {
                ActionBatch::default()
            }
            fn on_exit(&self, _p: Option<()>, _f: &FlagSender<Flag>) -> ActionBatch<'_> {
                ActionBatch::new().main_thread(0, || std::thread::sleep(Duration::from_millis(20)))
            }
        }

        let exec = executor().with_rung_deadline(Duration::from_millis(2));
        let mut fsm: Fsm<State, Flag> = Fsm::new(exec);
        fsm.add_behaviour_instance(State::Idle, SlowExit, BehaviourParams::none());
        fsm.set_transition(State::Idle, Flag::Go, State::Walk);
        fsm.force_transition(State::Idle);

        assert!(matches!(fsm.transition(Flag::Go), Err(FsmError::Batch(_))));
        assert_eq!(fsm.current_state(), Some(State::Idle));
    }
}
