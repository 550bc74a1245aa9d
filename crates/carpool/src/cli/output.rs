//! Plain-text rendering of request results.

use std::fmt::Write;

use crate::model::{Participation, User};
use crate::request::Response;
use crate::stats::RideStats;
use crate::view::{ParticipantInfo, RideDetail, RideSummary};

/// Render `response` for a terminal.
#[must_use]
pub fn render_plain(response: &Response) -> String {
    match response {
        Response::User(user) => user_line(user),
        Response::Users(users) => lines(users.iter().map(user_line)),
        Response::Ride(ride) => ride_line(ride),
        Response::Rides(rides) => lines(rides.iter().map(ride_line)),
        Response::RideDetail(detail) => detail_block(detail),
        Response::Participation(participation) => participation_line(participation),
        Response::Stats(stats) => stats_line(stats),
    }
}

fn lines(items: impl Iterator<Item = String>) -> String {
    let rendered: Vec<String> = items.collect();
    if rendered.is_empty() {
        "(none)".to_string()
    } else {
        rendered.join("\n")
    }
}

fn user_line(user: &User) -> String {
    match &user.plate {
        Some(plate) => format!("{:<16} {}  [driver, plate {plate}]", user.alias, user.name),
        None => format!("{:<16} {}", user.alias, user.name),
    }
}

fn ride_line(ride: &RideSummary) -> String {
    format!(
        "#{:<4} {}  {:<10} {}/{} seats free  driver {}  to {}",
        ride.id,
        ride.ride_date_and_time,
        ride.status,
        ride.available_spaces,
        ride.allowed_spaces,
        ride.driver,
        ride.final_address
    )
}

fn detail_block(detail: &RideDetail) -> String {
    let mut out = ride_line(&detail.ride);
    if detail.participants.is_empty() {
        out.push_str("\n  (no participants)");
    }
    for entry in &detail.participants {
        let confirmed = entry
            .confirmation
            .map(|at| format!("  confirmed {}", at.format("%Y/%m/%d %H:%M")))
            .unwrap_or_default();
        let _ = write!(
            out,
            "\n  {:<16} {:<10} {} seat(s) to {}{confirmed}\n    history: {}",
            entry.participant.alias,
            entry.status,
            entry.occupied_spaces,
            entry.destination,
            history(&entry.participant)
        );
    }
    out
}

fn history(info: &ParticipantInfo) -> String {
    stats_line(&RideStats {
        total: info.previous_rides_total,
        completed: info.previous_rides_completed,
        missing: info.previous_rides_missing,
        not_marked: info.previous_rides_not_marked,
        rejected: info.previous_rides_rejected,
    })
}

fn participation_line(participation: &Participation) -> String {
    format!(
        "{} on ride #{}: {} ({} seat(s) to {})",
        participation.participant,
        participation.ride_id,
        participation.status,
        participation.occupied_spaces,
        participation.destination
    )
}

fn stats_line(stats: &RideStats) -> String {
    format!(
        "total {}, completed {}, missing {}, not marked {}, rejected {}",
        stats.total, stats.completed, stats.missing, stats.not_marked, stats.rejected
    )
}
