//! Rider-side transitions: join, accept, reject, unload.

use chrono::Utc;
use tracing::{debug, info};

use super::{
    find_participation, owned_ride, positive_seats, require_participation_status,
    require_ride_status, required, RideService,
};
use crate::capacity::available_spaces;
use crate::error::{Error, Result};
use crate::model::{Participation, ParticipationStatus, RideId, RideStatus};
use crate::storage::{EntityStore, NewParticipation};

impl<S: EntityStore> RideService<S> {
    /// Ask to join one of `driver`'s rides, creating a `Waiting` participation.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown driver, rider or ride.
    /// - `Forbidden` if the ride is not `driver`'s, or the rider is its driver.
    /// - `InvalidState` unless the ride is `Ready`.
    /// - `Conflict` if the rider already has a participation on this ride.
    /// - `InvalidInput` for a blank destination or non-positive seat count.
    /// - `CapacityExceeded` if the seats do not fit.
    pub fn request_to_join(
        &self,
        driver: &str,
        ride_id: RideId,
        participant: &str,
        destination: &str,
        seats: i64,
    ) -> Result<Participation> {
        self.run(|store| {
            let ride = owned_ride(store, driver, ride_id)?;
            store.get_user(participant)?;
            if ride.is_driven_by(participant) {
                return Err(Error::forbidden(format!(
                    "'{participant}' drives ride {ride_id} and cannot join it"
                )));
            }
            require_ride_status(&ride, RideStatus::Ready, "request to join")?;

            let participations = store.list_participations(ride_id)?;
            if participations.iter().any(|p| p.participant == participant) {
                return Err(Error::conflict(format!(
                    "'{participant}' already requested to join ride {ride_id}"
                )));
            }

            let destination = required(destination, "destination")?;
            let seats = positive_seats(seats, "occupied spaces")?;
            let available = available_spaces(&ride, &participations);
            if seats > available {
                debug!(ride_id, participant, seats, available, "join request over capacity");
                return Err(Error::CapacityExceeded {
                    requested: seats,
                    available,
                });
            }

            let new = NewParticipation {
                ride_id,
                participant: participant.to_string(),
                destination,
                occupied_spaces: seats,
            };
            let id = store.create_participation(&new)?;
            info!(ride_id, participant, seats, "join request recorded");

            Ok(Participation {
                id,
                ride_id,
                participant: new.participant,
                destination: new.destination,
                occupied_spaces: seats,
                status: ParticipationStatus::Waiting,
                confirmation: None,
            })
        })
    }

    /// Driver accepts a waiting request; its seats become held.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown driver, ride or participation.
    /// - `Forbidden` if the ride is not `driver`'s.
    /// - `InvalidState` unless the ride is `Ready` and the request `Waiting`.
    /// - `CapacityExceeded` if earlier acceptances used up the seats.
    pub fn accept(&self, driver: &str, ride_id: RideId, participant: &str) -> Result<Participation> {
        self.run(|store| {
            let ride = owned_ride(store, driver, ride_id)?;
            require_ride_status(&ride, RideStatus::Ready, "accept requests")?;

            let participations = store.list_participations(ride_id)?;
            let participation = find_participation(&participations, participant, ride_id)?;
            require_participation_status(participation, ParticipationStatus::Waiting)?;

            let available = available_spaces(&ride, &participations);
            if participation.occupied_spaces > available {
                return Err(Error::CapacityExceeded {
                    requested: participation.occupied_spaces,
                    available,
                });
            }

            let now = Utc::now();
            store.confirm_participation(participation.id, now)?;
            info!(ride_id, participant, "join request accepted");

            Ok(Participation {
                status: ParticipationStatus::Confirmed,
                confirmation: Some(now),
                ..participation.clone()
            })
        })
    }

    /// Driver turns down a waiting request.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown driver, ride or participation.
    /// - `Forbidden` if the ride is not `driver`'s.
    /// - `InvalidState` unless the ride is `Ready` and the request `Waiting`.
    pub fn reject(&self, driver: &str, ride_id: RideId, participant: &str) -> Result<Participation> {
        self.run(|store| {
            let ride = owned_ride(store, driver, ride_id)?;
            require_ride_status(&ride, RideStatus::Ready, "reject requests")?;

            let participations = store.list_participations(ride_id)?;
            let participation = find_participation(&participations, participant, ride_id)?;
            require_participation_status(participation, ParticipationStatus::Waiting)?;

            store.update_participation_status(participation.id, ParticipationStatus::Rejected)?;
            info!(ride_id, participant, "join request rejected");

            Ok(Participation {
                status: ParticipationStatus::Rejected,
                ..participation.clone()
            })
        })
    }

    /// A rider on a started ride gets off; the participation completes.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown rider, ride or participation.
    /// - `InvalidState` unless both the ride and the participation are `InProgress`.
    pub fn unload(&self, participant: &str, ride_id: RideId) -> Result<Participation> {
        self.run(|store| {
            store.get_user(participant)?;
            let ride = store.get_ride(ride_id)?;
            require_ride_status(&ride, RideStatus::InProgress, "unload")?;

            let participations = store.list_participations(ride_id)?;
            let participation = find_participation(&participations, participant, ride_id)?;
            require_participation_status(participation, ParticipationStatus::InProgress)?;

            store.update_participation_status(participation.id, ParticipationStatus::Completed)?;
            info!(ride_id, participant, "participant unloaded");

            Ok(Participation {
                status: ParticipationStatus::Completed,
                ..participation.clone()
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{join, ride, service};
    use crate::capacity::available_spaces;
    use crate::error::{Error, ErrorKind};
    use crate::model::ParticipationStatus;
    use crate::storage::EntityStore;

    #[test]
    fn test_request_to_join_creates_waiting() {
        let service = service();
        let ride_id = ride(&service, 2);

        let participation = service
            .request_to_join("jperez", ride_id, "lgomez", "Surquillo", 1)
            .unwrap();
        assert_eq!(participation.status, ParticipationStatus::Waiting);
        assert!(participation.confirmation.is_none());
        assert_eq!(participation.destination, "Surquillo");
    }

    #[test]
    fn test_request_to_join_over_capacity() {
        let service = service();
        let ride_id = ride(&service, 2);

        let err = service
            .request_to_join("jperez", ride_id, "lgomez", "Surquillo", 3)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::CapacityExceeded {
                requested: 3,
                available: 2
            }
        ));
        assert!(service.ride_detail("jperez", ride_id).unwrap().participants.is_empty());
    }

    #[test]
    fn test_request_to_join_duplicate_is_conflict_whatever_status() {
        let service = service();
        let ride_id = ride(&service, 2);
        join(&service, ride_id, "lgomez");
        service.reject("jperez", ride_id, "lgomez").unwrap();

        let err = service
            .request_to_join("jperez", ride_id, "lgomez", "Surquillo", 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_request_to_join_invalid_input() {
        let service = service();
        let ride_id = ride(&service, 2);

        let err = service
            .request_to_join("jperez", ride_id, "lgomez", "  ", 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = service
            .request_to_join("jperez", ride_id, "lgomez", "Surquillo", 0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_driver_cannot_join_own_ride() {
        let service = service();
        let ride_id = ride(&service, 2);

        let err = service
            .request_to_join("jperez", ride_id, "jperez", "Surquillo", 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_request_to_join_wrong_driver() {
        let service = service();
        let ride_id = ride(&service, 2);

        let err = service
            .request_to_join("acastro", ride_id, "lgomez", "Surquillo", 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_request_to_join_unknown_entities() {
        let service = service();
        let ride_id = ride(&service, 2);

        for (driver, ride, rider) in [
            ("ghost", ride_id, "lgomez"),
            ("jperez", 99, "lgomez"),
            ("jperez", ride_id, "ghost"),
        ] {
            let err = service
                .request_to_join(driver, ride, rider, "Surquillo", 1)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
    }

    #[test]
    fn test_request_to_join_started_ride() {
        let service = service();
        let ride_id = ride(&service, 2);
        service.start_ride("jperez", ride_id, &[]).unwrap();

        let err = service
            .request_to_join("jperez", ride_id, "lgomez", "Surquillo", 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_accept_confirms_and_stamps() {
        let service = service();
        let ride_id = ride(&service, 2);
        join(&service, ride_id, "lgomez");

        let accepted = service.accept("jperez", ride_id, "lgomez").unwrap();
        assert_eq!(accepted.status, ParticipationStatus::Confirmed);
        assert!(accepted.confirmation.is_some());

        let detail = service.ride_detail("jperez", ride_id).unwrap();
        assert_eq!(detail.ride.available_spaces, 1);
        assert!(detail.participants[0].confirmation.is_some());
    }

    #[test]
    fn test_accept_rechecks_capacity() {
        let service = service();
        let ride_id = ride(&service, 1);
        join(&service, ride_id, "lgomez");
        join(&service, ride_id, "mvega");

        service.accept("jperez", ride_id, "lgomez").unwrap();
        let err = service.accept("jperez", ride_id, "mvega").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);

        let detail = service.ride_detail("jperez", ride_id).unwrap();
        assert_eq!(detail.participants[1].status, ParticipationStatus::Waiting);
        assert_eq!(detail.ride.available_spaces, 0);
    }

    #[test]
    fn test_accept_or_reject_non_waiting_leaves_status() {
        let service = service();
        let ride_id = ride(&service, 2);
        join(&service, ride_id, "lgomez");
        join(&service, ride_id, "mvega");
        service.accept("jperez", ride_id, "lgomez").unwrap();
        service.reject("jperez", ride_id, "mvega").unwrap();

        for alias in ["lgomez", "mvega"] {
            let err = service.accept("jperez", ride_id, alias).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidState);
            let err = service.reject("jperez", ride_id, alias).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidState);
        }

        let detail = service.ride_detail("jperez", ride_id).unwrap();
        assert_eq!(detail.participants[0].status, ParticipationStatus::Confirmed);
        assert_eq!(detail.participants[1].status, ParticipationStatus::Rejected);
    }

    #[test]
    fn test_accept_or_reject_after_start_leaves_status() {
        let service = service();
        let ride_id = ride(&service, 2);
        join(&service, ride_id, "lgomez");
        service.reject("jperez", ride_id, "lgomez").unwrap();
        service.start_ride("jperez", ride_id, &[]).unwrap();

        let err = service.accept("jperez", ride_id, "lgomez").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        let err = service.reject("jperez", ride_id, "lgomez").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        service.end_ride("jperez", ride_id).unwrap();
        let err = service.accept("jperez", ride_id, "lgomez").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let detail = service.ride_detail("jperez", ride_id).unwrap();
        assert_eq!(detail.participants[0].status, ParticipationStatus::Rejected);
        assert!(detail.participants[0].confirmation.is_none());
    }

    #[test]
    fn test_reject_has_no_confirmation() {
        let service = service();
        let ride_id = ride(&service, 2);
        join(&service, ride_id, "lgomez");

        let rejected = service.reject("jperez", ride_id, "lgomez").unwrap();
        assert_eq!(rejected.status, ParticipationStatus::Rejected);
        assert!(rejected.confirmation.is_none());
    }

    #[test]
    fn test_accept_unknown_participation() {
        let service = service();
        let ride_id = ride(&service, 2);
        let err = service.accept("jperez", ride_id, "lgomez").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_accept_by_other_driver_forbidden() {
        let service = service();
        let ride_id = ride(&service, 2);
        join(&service, ride_id, "lgomez");

        let err = service.accept("acastro", ride_id, "lgomez").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_unload_completes() {
        let service = service();
        let ride_id = ride(&service, 2);
        join(&service, ride_id, "lgomez");
        service.accept("jperez", ride_id, "lgomez").unwrap();
        service
            .start_ride("jperez", ride_id, &["lgomez".to_string()])
            .unwrap();

        let unloaded = service.unload("lgomez", ride_id).unwrap();
        assert_eq!(unloaded.status, ParticipationStatus::Completed);

        // Completed riders no longer hold seats.
        let detail = service.ride_detail("jperez", ride_id).unwrap();
        assert_eq!(detail.ride.available_spaces, 2);

        let err = service.unload("lgomez", ride_id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_unload_before_start() {
        let service = service();
        let ride_id = ride(&service, 2);
        join(&service, ride_id, "lgomez");
        service.accept("jperez", ride_id, "lgomez").unwrap();

        let err = service.unload("lgomez", ride_id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_unload_missing_rider() {
        let service = service();
        let ride_id = ride(&service, 2);
        join(&service, ride_id, "lgomez");
        service.accept("jperez", ride_id, "lgomez").unwrap();
        service.start_ride("jperez", ride_id, &[]).unwrap();

        let err = service.unload("lgomez", ride_id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        let err = service.unload("mvega", ride_id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_available_spaces_never_negative() {
        let service = service();
        let ride_id = ride(&service, 2);
        let riders = ["lgomez", "mvega", "acastro"];
        for alias in riders {
            join(&service, ride_id, alias);
        }
        for alias in riders {
            let _ = service.accept("jperez", ride_id, alias);
        }

        let store = service.store.lock().unwrap();
        let ride = store.get_ride(ride_id).unwrap();
        let participations = store.list_participations(ride_id).unwrap();
        let held: u32 = participations
            .iter()
            .filter(|p| p.status.occupies_seats())
            .map(|p| p.occupied_spaces)
            .sum();
        assert!(held <= ride.allowed_spaces);
        assert_eq!(available_spaces(&ride, &participations), ride.allowed_spaces - held);
    }
}
