//! Daemon state: settings, history, the live round and the break reminder.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};
use vision_games::cues::CuePlayer;
use vision_games::reminder::BreakReminder;
use vision_games::time::Duration;
use vision_games::{GameKind, HistoryStore, Prng, ResultRecord, RoundPhase, RoundSummary, Viewport};

use crate::cues::{ClientTones, LogNotifier};
use crate::error::DaemonError;
use crate::history_file::FileHistory;
use crate::paths::AppPaths;
use crate::protocol::{HistoryRow, Request, Response, StateSnapshot};
use crate::session::{ActiveGame, Outcome};
use crate::settings::Settings;

pub struct DaemonState {
    paths: AppPaths,
    settings: Settings,
    history: FileHistory,
    game: Option<ActiveGame>,
    viewport: Viewport,
    rng: Prng,
    cues: CuePlayer<ClientTones>,
    reminder: BreakReminder,
    notifier: LogNotifier,
    last_result: Option<RoundSummary>,
    notice: Option<String>,
    frame: u64,
}

fn parse_game(label: &str) -> Result<GameKind, DaemonError> {
    Ok(GameKind::parse(label)?)
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5EED)
}

impl DaemonState {
    pub fn new(paths: AppPaths) -> Self {
        Self::with_seed(paths, clock_seed())
    }

    pub fn with_seed(paths: AppPaths, seed: u64) -> Self {
        let settings = Settings::load(&paths.settings_file());
        let history = FileHistory::open(paths.history_file());
        info!(
            "Loaded settings and history from {}",
            paths.data_dir().display()
        );
        Self {
            cues: CuePlayer::new(ClientTones::new(false), settings.sound),
            reminder: BreakReminder::new(settings.break_reminders),
            notifier: LogNotifier::default(),
            paths,
            settings,
            history,
            game: None,
            viewport: Viewport::default(),
            rng: Prng::new(seed),
            last_result: None,
            notice: None,
            frame: 0,
        }
    }

    pub fn target_fps(&self) -> u32 {
        self.settings.target_fps
    }

    /// One frame of the tick loop.
    pub fn tick(&mut self, dt: Duration) {
        self.frame += 1;
        self.reminder.tick(dt, &mut self.notifier);
        if let Some(msg) = self.notifier.take() {
            self.notice = Some(msg);
        }
        if let Some(advisory) = self.reminder.take_advisory() {
            self.disable_reminders(advisory);
        }

        let outcome = match self.game.as_mut() {
            Some(game) => game.tick(dt, &mut self.rng),
            None => return,
        };
        self.settle(outcome);
    }

    /// Turn break reminders off for good after the notifier failed.
    fn disable_reminders(&mut self, advisory: String) {
        self.notice = Some(advisory);
        self.settings.break_reminders = false;
        self.reminder.set_enabled(false);
        if let Err(e) = self.settings.save(&self.paths.settings_file()) {
            warn!("Settings not saved: {}", e);
        }
    }

    /// Save everything that is persisted. Used on shutdown.
    pub fn save(&self) -> Result<(), DaemonError> {
        self.settings.save(&self.paths.settings_file())?;
        self.history.save()
    }

    /// Stop the live round, recording its result.
    pub fn stop_round(&mut self) -> Option<RoundSummary> {
        let outcome = self.game.as_mut()?.stop();
        self.settle(outcome)
    }

    pub fn handle(&mut self, request: Request) -> Response {
        match request {
            Request::GetState => Response::State(Box::new(self.snapshot())),
            Request::Start { game } => match parse_game(&game) {
                Ok(kind) => {
                    self.stop_round();
                    let mut round = ActiveGame::new(kind, &self.settings, self.viewport);
                    let outcome = round.start(&mut self.rng);
                    self.game = Some(round);
                    self.settle(outcome);
                    info!(game = %kind, "Round started");
                    Response::State(Box::new(self.snapshot()))
                }
                Err(e) => Response::error(e.to_string()),
            },
            Request::Respond { input } => {
                let Some(game) = self.game.as_mut() else {
                    return Response::error(DaemonError::NoRound.to_string());
                };
                let outcome = game.respond(&input, &mut self.rng);
                self.settle(outcome);
                Response::State(Box::new(self.snapshot()))
            }
            Request::Stop => match self.stop_round() {
                Some(summary) => Response::success(format!("Recorded {}", summary.payload.label())),
                None => Response::success("Stopped"),
            },
            Request::Hint => match self.game.as_mut().and_then(ActiveGame::hint) {
                Some(_) => Response::State(Box::new(self.snapshot())),
                None => Response::error("No hint for this game"),
            },
            Request::Resize { width, height } => {
                self.viewport = Viewport::new(width, height).sanitized();
                if let Some(game) = self.game.as_mut() {
                    game.set_viewport(self.viewport);
                }
                Response::success(format!(
                    "Viewport {}x{}",
                    self.viewport.width, self.viewport.height
                ))
            }
            Request::GetHistory { game } => match parse_game(&game) {
                Ok(kind) => Response::History {
                    game: kind,
                    rows: self
                        .history
                        .list(kind)
                        .into_iter()
                        .map(HistoryRow::from)
                        .collect(),
                },
                Err(e) => Response::error(e.to_string()),
            },
            Request::ClearHistory { game } => match parse_game(&game) {
                Ok(kind) => {
                    self.history.clear(kind);
                    Response::success(format!("Cleared {} history", kind.display_name()))
                }
                Err(e) => Response::error(e.to_string()),
            },
            Request::GetSettings => Response::settings(&self.settings),
            Request::SetSettings { settings } => {
                self.apply_settings(settings);
                match self.settings.save(&self.paths.settings_file()) {
                    Ok(()) => Response::settings(&self.settings),
                    Err(e) => {
                        warn!("Settings not saved: {}", e);
                        Response::error(format!("Settings applied but not saved: {e}"))
                    }
                }
            }
            // The server loop owns process exit; here it only means "persist".
            Request::Shutdown => match self.save() {
                Ok(()) => Response::success("Shutting down"),
                Err(e) => Response::error(format!("Save failed, aborting shutdown: {e}")),
            },
        }
    }

    fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings.sanitized();
        self.cues.set_enabled(self.settings.sound);
        self.reminder.set_enabled(self.settings.break_reminders);
        let outcome = match self.game.as_mut() {
            Some(game) => game.apply_settings(&self.settings, &mut self.rng),
            None => return,
        };
        self.settle(outcome);
    }

    /// Play pending cues and record a finished round.
    fn settle(&mut self, outcome: Outcome) -> Option<RoundSummary> {
        if let Some(tone) = self.game.as_mut().and_then(ActiveGame::take_cue) {
            self.cues.play(tone);
        }
        let summary = outcome.into_summary()?;
        let record = ResultRecord::now(summary.clone(), self.settings.player_name.clone());
        self.history.append(record);
        self.last_result = Some(summary.clone());
        Some(summary)
    }

    fn snapshot(&mut self) -> StateSnapshot {
        let (game, phase, stimulus, hud) = match self.game.as_ref() {
            Some(g) => (Some(g.kind()), g.phase(), g.stimulus(), g.hud()),
            None => (None, RoundPhase::Idle, None, Default::default()),
        };
        StateSnapshot {
            frame: self.frame,
            game,
            phase,
            stimulus,
            hud,
            tones: self.cues.emitter_mut().drain(),
            last_result: self.last_result.clone(),
            result_detail: self
                .last_result
                .as_ref()
                .and_then(|r| r.payload.detail())
                .map(str::to_string),
            notice: self.notice.take(),
        }
    }
}
