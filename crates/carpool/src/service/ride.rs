//! Driver-side transitions: create, start, end.

use std::collections::HashSet;

use tracing::{debug, info};

use super::{owned_ride, positive_seats, require_ride_status, required, RideService};
use crate::error::{Error, Result};
use crate::model::{parse_ride_date_time, ParticipationStatus, RideId, RideStatus};
use crate::storage::{EntityStore, NewRide};
use crate::view::RideSummary;

impl<S: EntityStore> RideService<S> {
    /// Publish a new `Ready` ride.
    ///
    /// `date_time` must follow `YYYY/MM/DD HH:MM`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `driver` is not registered.
    /// - `Forbidden` if `driver` has no plate on file.
    /// - `InvalidInput` for a blank address, a non-positive seat count or a
    ///   malformed date-time.
    pub fn create_ride(
        &self,
        driver: &str,
        date_time: &str,
        final_address: &str,
        allowed_spaces: i64,
    ) -> Result<RideSummary> {
        self.run(|store| {
            let user = store.get_user(driver)?;
            if !user.is_driver() {
                return Err(Error::forbidden(format!(
                    "'{driver}' has no vehicle plate and cannot create rides"
                )));
            }

            let new = NewRide {
                date_time: parse_ride_date_time(&required(date_time, "ride date-time")?)?,
                final_address: required(final_address, "final address")?,
                allowed_spaces: positive_seats(allowed_spaces, "allowed spaces")?,
                driver: user.alias,
            };
            let id = store.create_ride(&new)?;
            info!(ride_id = id, driver, seats = new.allowed_spaces, "ride created");

            let ride = store.get_ride(id)?;
            Ok(RideSummary::new(&ride, &[]))
        })
    }

    /// Board the ride with a single roll-call.
    ///
    /// Every `Confirmed` rider named in `present` goes `InProgress`, the rest
    /// go `Missing`. Aliases in `present` without a confirmed seat are ignored.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown driver or ride.
    /// - `Forbidden` if the ride is not `driver`'s.
    /// - `InvalidState` unless the ride is `Ready` with no `Waiting` request left.
    pub fn start_ride(
        &self,
        driver: &str,
        ride_id: RideId,
        present: &[String],
    ) -> Result<RideSummary> {
        self.run(|store| {
            let mut ride = owned_ride(store, driver, ride_id)?;
            require_ride_status(&ride, RideStatus::Ready, "start")?;

            let participations = store.list_participations(ride_id)?;
            if participations
                .iter()
                .any(|p| p.status == ParticipationStatus::Waiting)
            {
                return Err(Error::invalid_state(format!(
                    "cannot start ride {ride_id}: not all requests resolved"
                )));
            }

            let present: HashSet<&str> = present.iter().map(|alias| alias.trim()).collect();
            store.update_ride_status(ride_id, RideStatus::InProgress)?;
            ride.status = RideStatus::InProgress;

            let mut boarded = 0_usize;
            let mut missing = 0_usize;
            for p in participations
                .iter()
                .filter(|p| p.status == ParticipationStatus::Confirmed)
            {
                let status = if present.contains(p.participant.as_str()) {
                    boarded += 1;
                    ParticipationStatus::InProgress
                } else {
                    missing += 1;
                    ParticipationStatus::Missing
                };
                store.update_participation_status(p.id, status)?;
            }

            for alias in &present {
                if !participations
                    .iter()
                    .any(|p| p.participant == *alias && p.status == ParticipationStatus::Confirmed)
                {
                    debug!(ride_id, alias, "ignoring present alias without a confirmed seat");
                }
            }

            info!(ride_id, boarded, missing, "ride started");
            Ok(RideSummary::new(&ride, &store.list_participations(ride_id)?))
        })
    }

    /// Finish the ride. Riders never unloaded are marked `NotMarked`.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown driver or ride.
    /// - `Forbidden` if the ride is not `driver`'s.
    /// - `InvalidState` unless the ride is `InProgress`.
    pub fn end_ride(&self, driver: &str, ride_id: RideId) -> Result<RideSummary> {
        self.run(|store| {
            let mut ride = owned_ride(store, driver, ride_id)?;
            require_ride_status(&ride, RideStatus::InProgress, "end")?;

            store.update_ride_status(ride_id, RideStatus::Finished)?;
            ride.status = RideStatus::Finished;

            let mut not_marked = 0_usize;
            for p in store
                .list_participations(ride_id)?
                .iter()
                .filter(|p| p.status == ParticipationStatus::InProgress)
            {
                store.update_participation_status(p.id, ParticipationStatus::NotMarked)?;
                not_marked += 1;
            }

            info!(ride_id, not_marked, "ride finished");
            Ok(RideSummary::new(&ride, &store.list_participations(ride_id)?))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{join, ride, service, RIDE_AT};
    use crate::error::{Error, ErrorKind};
    use crate::model::{ParticipationStatus, RideId, RideStatus};
    use crate::service::RideService;
    use crate::storage::Storage;

    fn statuses(service: &RideService<Storage>, ride_id: RideId) -> Vec<ParticipationStatus> {
        service
            .ride_detail("jperez", ride_id)
            .unwrap()
            .participants
            .iter()
            .map(|p| p.status)
            .collect()
    }

    #[test]
    fn test_create_ride() {
        let service = service();
        let summary = service
            .create_ride("jperez", RIDE_AT, "Av Javier Prado 456", 2)
            .unwrap();

        assert_eq!(summary.id, 1);
        assert_eq!(summary.status, RideStatus::Ready);
        assert_eq!(summary.ride_date_and_time, RIDE_AT);
        assert_eq!(summary.allowed_spaces, 2);
        assert_eq!(summary.available_spaces, 2);
        assert_eq!(ride(&service, 2), 2);
    }

    #[test]
    fn test_create_ride_requires_plate() {
        let service = service();
        let err = service
            .create_ride("lgomez", RIDE_AT, "Av Javier Prado 456", 2)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert!(service.active_rides().unwrap().is_empty());
    }

    #[test]
    fn test_create_ride_unknown_driver() {
        let service = service();
        let err = service
            .create_ride("ghost", RIDE_AT, "Av Javier Prado 456", 2)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "user", .. }));
    }

    #[test]
    fn test_create_ride_invalid_input() {
        let service = service();
        for (at, address, seats) in [
            ("15/07/2025 22:00", "Av Javier Prado 456", 2),
            ("2025-07-15 22:00", "Av Javier Prado 456", 2),
            ("", "Av Javier Prado 456", 2),
            (RIDE_AT, "   ", 2),
            (RIDE_AT, "Av Javier Prado 456", 0),
            (RIDE_AT, "Av Javier Prado 456", -3),
        ] {
            let err = service.create_ride("jperez", at, address, seats).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{at:?} {address:?} {seats}");
        }
    }

    #[test]
    fn test_full_lifecycle_without_unload() {
        let service = service();
        let ride_id = ride(&service, 2);

        let waiting = service
            .request_to_join("jperez", ride_id, "lgomez", "Surquillo", 1)
            .unwrap();
        assert_eq!(waiting.status, ParticipationStatus::Waiting);

        service.accept("jperez", ride_id, "lgomez").unwrap();
        let detail = service.ride_detail("jperez", ride_id).unwrap();
        assert_eq!(detail.ride.available_spaces, 1);

        let started = service
            .start_ride("jperez", ride_id, &["lgomez".to_string()])
            .unwrap();
        assert_eq!(started.status, RideStatus::InProgress);
        assert_eq!(statuses(&service, ride_id), [ParticipationStatus::InProgress]);

        let ended = service.end_ride("jperez", ride_id).unwrap();
        assert_eq!(ended.status, RideStatus::Finished);
        assert_eq!(statuses(&service, ride_id), [ParticipationStatus::NotMarked]);
    }

    #[test]
    fn test_start_then_end_with_nobody_present() {
        let service = service();
        let ride_id = ride(&service, 3);
        for alias in ["lgomez", "mvega", "acastro"] {
            join(&service, ride_id, alias);
        }
        service.accept("jperez", ride_id, "lgomez").unwrap();
        service.accept("jperez", ride_id, "mvega").unwrap();
        service.reject("jperez", ride_id, "acastro").unwrap();

        service.start_ride("jperez", ride_id, &[]).unwrap();
        let ended = service.end_ride("jperez", ride_id).unwrap();

        assert_eq!(ended.status, RideStatus::Finished);
        assert_eq!(
            statuses(&service, ride_id),
            [
                ParticipationStatus::Missing,
                ParticipationStatus::Missing,
                ParticipationStatus::Rejected,
            ]
        );
    }

    #[test]
    fn test_start_with_unresolved_request() {
        let service = service();
        let ride_id = ride(&service, 2);
        join(&service, ride_id, "lgomez");
        join(&service, ride_id, "mvega");
        service.accept("jperez", ride_id, "lgomez").unwrap();

        let err = service
            .start_ride("jperez", ride_id, &["lgomez".to_string()])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(err.to_string().contains("not all requests resolved"));

        // Nothing moved.
        let detail = service.ride_detail("jperez", ride_id).unwrap();
        assert_eq!(detail.ride.status, RideStatus::Ready);
        assert_eq!(
            statuses(&service, ride_id),
            [ParticipationStatus::Confirmed, ParticipationStatus::Waiting]
        );
    }

    #[test]
    fn test_start_ignores_unknown_present_aliases() {
        let service = service();
        let ride_id = ride(&service, 2);
        join(&service, ride_id, "lgomez");
        service.accept("jperez", ride_id, "lgomez").unwrap();

        let present = vec!["mvega".to_string(), " lgomez ".to_string(), "ghost".to_string()];
        service.start_ride("jperez", ride_id, &present).unwrap();
        assert_eq!(statuses(&service, ride_id), [ParticipationStatus::InProgress]);
    }

    #[test]
    fn test_start_twice() {
        let service = service();
        let ride_id = ride(&service, 2);
        service.start_ride("jperez", ride_id, &[]).unwrap();

        let err = service.start_ride("jperez", ride_id, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_end_before_start() {
        let service = service();
        let ride_id = ride(&service, 2);

        let err = service.end_ride("jperez", ride_id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_end_twice() {
        let service = service();
        let ride_id = ride(&service, 2);
        service.start_ride("jperez", ride_id, &[]).unwrap();
        service.end_ride("jperez", ride_id).unwrap();

        let err = service.end_ride("jperez", ride_id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_end_keeps_completed_riders() {
        let service = service();
        let ride_id = ride(&service, 2);
        join(&service, ride_id, "lgomez");
        join(&service, ride_id, "mvega");
        service.accept("jperez", ride_id, "lgomez").unwrap();
        service.accept("jperez", ride_id, "mvega").unwrap();
        let present = vec!["lgomez".to_string(), "mvega".to_string()];
        service.start_ride("jperez", ride_id, &present).unwrap();
        service.unload("lgomez", ride_id).unwrap();

        service.end_ride("jperez", ride_id).unwrap();
        assert_eq!(
            statuses(&service, ride_id),
            [ParticipationStatus::Completed, ParticipationStatus::NotMarked]
        );

        let stats = service.stats("lgomez").unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(service.stats("mvega").unwrap().not_marked, 1);
    }

    #[test]
    fn test_start_by_other_driver_forbidden() {
        let service = service();
        let ride_id = ride(&service, 2);

        let err = service.start_ride("acastro", ride_id, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        let err = service.end_ride("acastro", ride_id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_stats_mixed_history() {
        let service = service();

        let first = ride(&service, 2);
        join(&service, first, "lgomez");
        service.accept("jperez", first, "lgomez").unwrap();
        service
            .start_ride("jperez", first, &["lgomez".to_string()])
            .unwrap();
        service.unload("lgomez", first).unwrap();

        let second = ride(&service, 2);
        join(&service, second, "lgomez");
        service.reject("jperez", second, "lgomez").unwrap();

        let third = ride(&service, 2);
        join(&service, third, "lgomez");

        let stats = service.stats("lgomez").unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.missing, 0);
        assert_eq!(stats.not_marked, 0);
    }
}
