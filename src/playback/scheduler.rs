//! Timed replay of recorded actions
//!
//! Every action gets its own task, all started from the same playback origin.
//! A task sleeps until its recorded start, emits the press (or move), sleeps
//! for the recorded hold and emits the release. Actions whose windows overlap
//! therefore overlap during replay too. Playback completes when every task has
//! finished.

use crate::actions::model::Action;
use crate::playback::actuator::Actuator;
use crate::processing::coordinate_correction::CoordinateCorrection;
use crate::recorder::channel::{RecordingError, RecordingResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Observed at every playback suspend point
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Token that is never cancelled
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            // Owner went away without cancelling
            std::future::pending::<()>().await;
        }
    }
}

/// Owner side of a [`CancelToken`]
#[derive(Debug, Clone)]
pub struct PlaybackCancel {
    tx: Arc<watch::Sender<bool>>,
}

impl PlaybackCancel {
    pub fn pair() -> (Self, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, CancelToken { rx })
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

/// Outcome of one playback run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackSummary {
    pub total: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionOutcome {
    Completed,
    Cancelled,
}

/// Drives an [`Actuator`] from a set of recorded actions
#[derive(Clone)]
pub struct PlaybackScheduler {
    actuator: Arc<dyn Actuator>,
    correction: CoordinateCorrection,
}

impl PlaybackScheduler {
    pub fn new(actuator: Arc<dyn Actuator>, correction: CoordinateCorrection) -> Self {
        Self {
            actuator,
            correction,
        }
    }

    /// Replay `actions` and wait for all of them
    pub async fn play(&self, actions: Vec<Action>) -> RecordingResult<PlaybackSummary> {
        self.play_until(actions, CancelToken::never()).await
    }

    /// Replay `actions` until done or until `cancel` fires
    ///
    /// A failing action does not stop the others; the first failure is
    /// returned once every task has finished.
    pub async fn play_until(
        &self,
        actions: Vec<Action>,
        cancel: CancelToken,
    ) -> RecordingResult<PlaybackSummary> {
        let origin = Instant::now();
        let mut summary = PlaybackSummary {
            total: actions.len(),
            ..Default::default()
        };

        tracing::info!("Playing {} actions...", summary.total);

        let mut tasks = JoinSet::new();
        for action in actions {
            tasks.spawn(replay_action(
                action,
                origin,
                self.actuator.clone(),
                self.correction,
                cancel.clone(),
            ));
        }

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(ActionOutcome::Completed)) => summary.completed += 1,
                Ok(Ok(ActionOutcome::Cancelled)) => summary.cancelled += 1,
                Ok(Err(e)) => {
                    tracing::warn!("Playback action failed: {}", e);
                    summary.failed += 1;
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    tracing::error!("Playback task aborted: {}", e);
                    summary.failed += 1;
                    first_error.get_or_insert(RecordingError::PlaybackError(e.to_string()));
                }
            }
        }
        summary.elapsed = origin.elapsed();

        if let Some(e) = first_error {
            return Err(e);
        }

        if summary.cancelled > 0 {
            tracing::info!(
                "Playback cancelled ({} of {} actions completed)",
                summary.completed,
                summary.total
            );
        } else {
            tracing::info!(
                "Playing actions completed! ({} actions in {:?})",
                summary.completed,
                summary.elapsed
            );
        }
        Ok(summary)
    }
}

async fn replay_action(
    action: Action,
    origin: Instant,
    actuator: Arc<dyn Actuator>,
    correction: CoordinateCorrection,
    mut cancel: CancelToken,
) -> RecordingResult<ActionOutcome> {
    // A start already in the past fires immediately
    let due = origin + action.start_time();
    tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(ActionOutcome::Cancelled),
        _ = tokio::time::sleep_until(due) => {}
    }

    press(&action, actuator.as_ref(), &correction)?;

    let Some(hold) = action.hold() else {
        return Ok(ActionOutcome::Completed);
    };

    let cancelled = tokio::select! {
        biased;
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(hold) => false,
    };

    // Never leave a key or button held down, even when cancelled
    release(&action, actuator.as_ref())?;

    Ok(if cancelled {
        ActionOutcome::Cancelled
    } else {
        ActionOutcome::Completed
    })
}

fn press(
    action: &Action,
    actuator: &dyn Actuator,
    correction: &CoordinateCorrection,
) -> RecordingResult<()> {
    match action {
        Action::Key(a) => actuator.key_down(a.key),
        Action::Mouse(a) => {
            let (x, y) = correction.apply(a.position);
            actuator.move_to(x, y)?;
            match a.event_type.button() {
                Some(button) => actuator.button_down(button),
                None => Ok(()),
            }
        }
    }
}

fn release(action: &Action, actuator: &dyn Actuator) -> RecordingResult<()> {
    match action {
        Action::Key(a) => actuator.key_up(a.key),
        Action::Mouse(a) => match a.event_type.button() {
            Some(button) => actuator.button_up(button),
            None => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::keycode::KeyCode;
    use crate::actions::model::{KeyAction, MouseAction, MouseButton, MouseEventType, Position};
    use crate::playback::actuator::{Effect, EffectLog, TimedEffect};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn key(k: KeyCode, start: u64, end: u64) -> Action {
        Action::Key(KeyAction {
            key: k,
            start_time: ms(start),
            end_time: Some(ms(end)),
        })
    }

    fn scheduler(log: &Arc<EffectLog>) -> PlaybackScheduler {
        PlaybackScheduler::new(log.clone(), CoordinateCorrection::identity())
    }

    fn at(effects: &[TimedEffect], effect: &Effect) -> Duration {
        effects
            .iter()
            .find(|e| &e.effect == effect)
            .map(|e| e.at)
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_is_pressed_and_released_on_schedule() {
        let log = Arc::new(EffectLog::new());
        let summary = scheduler(&log).play(vec![key(KeyCode::A, 100, 250)]).await.unwrap();

        assert_eq!(summary.completed, 1);
        assert_eq!(
            log.effects(),
            vec![
                TimedEffect {
                    at: ms(100),
                    effect: Effect::KeyDown(KeyCode::A),
                },
                TimedEffect {
                    at: ms(250),
                    effect: Effect::KeyUp(KeyCode::A),
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_actions_overlap() {
        let log = Arc::new(EffectLog::new());
        let shift = key(KeyCode::LShiftKey, 0, 500);
        let a = key(KeyCode::A, 100, 200);
        let drag = Action::Mouse(MouseAction::sample(Position::new(7, 8), ms(150)));

        let summary = scheduler(&log).play(vec![shift, a, drag]).await.unwrap();
        let effects = log.effects();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.completed, 3);
        assert_eq!(at(&effects, &Effect::KeyDown(KeyCode::LShiftKey)), ms(0));
        assert_eq!(at(&effects, &Effect::KeyDown(KeyCode::A)), ms(100));
        assert_eq!(at(&effects, &Effect::MoveTo { x: 7.0, y: 8.0 }), ms(150));
        assert_eq!(at(&effects, &Effect::KeyUp(KeyCode::A)), ms(200));
        assert_eq!(at(&effects, &Effect::KeyUp(KeyCode::LShiftKey)), ms(500));
        assert_eq!(summary.elapsed, ms(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_moves_then_holds_button() {
        let log = Arc::new(EffectLog::new());
        let click = Action::Mouse(MouseAction {
            event_type: MouseEventType::ClickRight,
            position: Position::new(2, 3),
            start_time: ms(20),
            end_time: Some(ms(70)),
        });
        let scheduler = PlaybackScheduler::new(
            log.clone(),
            CoordinateCorrection {
                scale_x: 10.0,
                scale_y: 10.0,
                offset_x: 1.0,
                offset_y: 0.0,
            },
        );

        scheduler.play(vec![click]).await.unwrap();

        assert_eq!(
            log.effects(),
            vec![
                TimedEffect {
                    at: ms(20),
                    effect: Effect::MoveTo { x: 21.0, y: 30.0 },
                },
                TimedEffect {
                    at: ms(20),
                    effect: Effect::ButtonDown(MouseButton::Right),
                },
                TimedEffect {
                    at: ms(70),
                    effect: Effect::ButtonUp(MouseButton::Right),
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_interval_releases_immediately() {
        let log = Arc::new(EffectLog::new());
        let open = Action::Key(KeyAction::open(KeyCode::Q, ms(30)));

        scheduler(&log).play(vec![open]).await.unwrap();

        let effects = log.effects();
        assert_eq!(at(&effects, &Effect::KeyDown(KeyCode::Q)), ms(30));
        assert_eq!(at(&effects, &Effect::KeyUp(KeyCode::Q)), ms(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_playback_completes() {
        let log = Arc::new(EffectLog::new());
        let summary = scheduler(&log).play(Vec::new()).await.unwrap();

        assert_eq!(summary, PlaybackSummary::default());
        assert!(log.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_pending_and_releases_held() {
        let log = Arc::new(EffectLog::new());
        let (cancel, token) = PlaybackCancel::pair();
        let scheduler = scheduler(&log);

        let playback = tokio::spawn(async move {
            scheduler
                .play_until(
                    vec![key(KeyCode::A, 0, 1_000), key(KeyCode::B, 500, 600)],
                    token,
                )
                .await
        });

        tokio::time::sleep(ms(100)).await;
        cancel.cancel();
        let summary = playback.await.unwrap().unwrap();

        assert_eq!(summary.cancelled, 2);
        assert_eq!(summary.completed, 0);
        let effects = log.effects();
        assert_eq!(at(&effects, &Effect::KeyDown(KeyCode::A)), ms(0));
        assert_eq!(at(&effects, &Effect::KeyUp(KeyCode::A)), ms(100));
        assert!(!effects.iter().any(|e| e.effect == Effect::KeyDown(KeyCode::B)));
    }

    #[test]
    fn test_never_token_is_not_cancelled() {
        assert!(!CancelToken::never().is_cancelled());

        let (cancel, token) = PlaybackCancel::pair();
        let second = cancel.token();
        cancel.cancel();
        assert!(token.is_cancelled());
        assert!(second.is_cancelled());
    }

    struct FailingActuator;

    impl Actuator for FailingActuator {
        fn key_down(&self, key: KeyCode) -> RecordingResult<()> {
            if key == KeyCode::X {
                Err(RecordingError::ActuatorError("X is stuck".to_string()))
            } else {
                Ok(())
            }
        }
        fn key_up(&self, _key: KeyCode) -> RecordingResult<()> {
            Ok(())
        }
        fn move_to(&self, _x: f64, _y: f64) -> RecordingResult<()> {
            Ok(())
        }
        fn button_down(&self, _button: MouseButton) -> RecordingResult<()> {
            Ok(())
        }
        fn button_up(&self, _button: MouseButton) -> RecordingResult<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_reported_after_all_tasks_finish() {
        let scheduler = PlaybackScheduler::new(
            Arc::new(FailingActuator),
            CoordinateCorrection::identity(),
        );
        let started = Instant::now();

        let err = scheduler
            .play(vec![key(KeyCode::X, 10, 20), key(KeyCode::Y, 0, 300)])
            .await
            .unwrap_err();

        assert!(matches!(err, RecordingError::ActuatorError(_)));
        assert_eq!(started.elapsed(), ms(300));
    }
}
