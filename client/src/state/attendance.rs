//! Work-day stage derivation and action guards.
//!
//! Everything here is a pure function of the server's record. The server
//! stays authoritative: a record whose timestamps are out of order is reported
//! but never repaired.

use chrono::{Duration, NaiveTime};
use std::fmt;

use crate::api::WorkSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkStage {
    Idle,
    Started,
    Lunch,
    Resumed,
    Finished,
}

impl WorkStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStage::Idle => "idle",
            WorkStage::Started => "started",
            WorkStage::Lunch => "lunch",
            WorkStage::Resumed => "resumed",
            WorkStage::Finished => "finished",
        }
    }
}

impl fmt::Display for WorkStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttendanceAction {
    Start,
    StartLunch,
    EndLunch,
    End,
}

impl AttendanceAction {
    pub const ALL: [AttendanceAction; 4] = [
        AttendanceAction::Start,
        AttendanceAction::StartLunch,
        AttendanceAction::EndLunch,
        AttendanceAction::End,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceAction::Start => "start",
            AttendanceAction::StartLunch => "lunch-start",
            AttendanceAction::EndLunch => "lunch-end",
            AttendanceAction::End => "end",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttendanceAction::Start => "Iniciar jornada",
            AttendanceAction::StartLunch => "Iniciar almuerzo",
            AttendanceAction::EndLunch => "Terminar almuerzo",
            AttendanceAction::End => "Terminar jornada",
        }
    }
}

impl fmt::Display for AttendanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First match wins: finished, resumed, lunch, started, idle.
pub fn derive_stage(session: Option<&WorkSession>) -> WorkStage {
    let Some(session) = session else {
        return WorkStage::Idle;
    };
    if session.end_time.is_some() {
        WorkStage::Finished
    } else if session.lunch_end.is_some() {
        WorkStage::Resumed
    } else if session.lunch_start.is_some() {
        WorkStage::Lunch
    } else if session.start_time.is_some() {
        WorkStage::Started
    } else {
        WorkStage::Idle
    }
}

pub fn is_action_enabled(session: Option<&WorkSession>, action: AttendanceAction) -> bool {
    let started = session.and_then(|s| s.start_time).is_some();
    let lunch_started = session.and_then(|s| s.lunch_start).is_some();
    let lunch_ended = session.and_then(|s| s.lunch_end).is_some();
    let ended = session.and_then(|s| s.end_time).is_some();

    match action {
        AttendanceAction::Start => !started,
        AttendanceAction::StartLunch => started && !lunch_started,
        AttendanceAction::EndLunch => lunch_started && !lunch_ended,
        AttendanceAction::End => started && !ended,
    }
}

pub fn enabled_actions(session: Option<&WorkSession>) -> Vec<AttendanceAction> {
    AttendanceAction::ALL
        .into_iter()
        .filter(|action| is_action_enabled(session, *action))
        .collect()
}

/// Most recent record by `work_date`; on equal dates the later list entry
/// wins.
pub fn current_session(sessions: &[WorkSession]) -> Option<&WorkSession> {
    sessions
        .iter()
        .enumerate()
        .max_by_key(|(index, session)| (session.work_date, *index))
        .map(|(_, session)| session)
}

/// A timestamp that is set while one it depends on is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingViolation {
    LunchWithoutStart,
    LunchEndWithoutLunchStart,
    EndWithoutStart,
    /// A later timestamp is earlier on the clock than the one before it.
    OutOfOrder,
}

impl WorkSession {
    pub fn ordering_violation(&self) -> Option<OrderingViolation> {
        if self.lunch_start.is_some() && self.start_time.is_none() {
            return Some(OrderingViolation::LunchWithoutStart);
        }
        if self.lunch_end.is_some() && self.lunch_start.is_none() {
            return Some(OrderingViolation::LunchEndWithoutLunchStart);
        }
        if self.end_time.is_some() && self.start_time.is_none() {
            return Some(OrderingViolation::EndWithoutStart);
        }

        let stamps: Vec<NaiveTime> = [
            self.start_time,
            self.lunch_start,
            self.lunch_end,
            self.end_time,
        ]
        .into_iter()
        .flatten()
        .collect();
        if stamps.windows(2).any(|pair| pair[1] < pair[0]) {
            return Some(OrderingViolation::OutOfOrder);
        }
        None
    }

    /// Time between start and end minus the lunch break, for finished days.
    pub fn worked_duration(&self) -> Option<Duration> {
        let worked = self.end_time? - self.start_time?;
        let lunch = match (self.lunch_start, self.lunch_end) {
            (Some(from), Some(to)) if to > from => to - from,
            _ => Duration::zero(),
        };
        let total = worked - lunch;
        (total >= Duration::zero()).then_some(total)
    }
}
