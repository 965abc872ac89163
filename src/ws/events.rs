// src/ws/events.rs
//
// Closed set of events pushed to connected clients. Names and payload shapes
// are part of the wire contract consumed by the web frontend and must stay
// stable; every variant serializes as {"event": <name>, "data": <payload>}.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    bookingmodel::Booking,
    reclamationmodel::Reclamation,
    ticketmodel::TicketWithMessages,
    usermodel::{MaintenancePage, User},
};

/// Pending-work counters shown on the admin console badge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationCounts {
    pub users: i64,
    pub tickets: i64,
    pub bookings: i64,
    pub reclamations: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "newTicket")]
    NewTicket(TicketWithMessages),

    #[serde(rename = "ticketUpdated")]
    TicketUpdated(TicketWithMessages),

    #[serde(rename = "ticketDeleted")]
    TicketDeleted { id: Uuid },

    #[serde(rename = "ticketArchived")]
    TicketArchived {
        id: Uuid,
        #[serde(rename = "archivedByUser", skip_serializing_if = "Option::is_none")]
        archived_by_user: Option<bool>,
        #[serde(rename = "archivedByAdmin", skip_serializing_if = "Option::is_none")]
        archived_by_admin: Option<bool>,
    },

    #[serde(rename = "newBooking")]
    NewBooking(Booking),

    #[serde(rename = "bookingUpdated")]
    BookingUpdated(Booking),

    #[serde(rename = "bookingDeleted")]
    BookingDeleted { id: Uuid },

    #[serde(rename = "newReclamation")]
    NewReclamation(Reclamation),

    #[serde(rename = "reclamationHidden")]
    ReclamationHidden { id: Uuid },

    #[serde(rename = "notificationCountsUpdated")]
    NotificationCountsUpdated(NotificationCounts),

    #[serde(rename = "userUpdated")]
    UserUpdated {
        user: User,
        #[serde(rename = "newToken")]
        new_token: String,
    },

    #[serde(rename = "forceBan")]
    ForceBan {
        #[serde(rename = "bannedToken")]
        banned_token: String,
    },

    #[serde(rename = "accountReactivated")]
    AccountReactivated {
        #[serde(rename = "newToken")]
        new_token: String,
    },

    #[serde(rename = "maintenanceStatusChanged")]
    MaintenanceStatusChanged(MaintenancePage),

    #[serde(rename = "userListUpdated")]
    UserListUpdated,

    #[serde(rename = "user:receive_warning")]
    UserReceiveWarning { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn events_serialize_with_verbatim_names() {
        let id = Uuid::new_v4();

        let cases: Vec<(ServerEvent, &str)> = vec![
            (ServerEvent::TicketDeleted { id }, "ticketDeleted"),
            (ServerEvent::BookingDeleted { id }, "bookingDeleted"),
            (ServerEvent::ReclamationHidden { id }, "reclamationHidden"),
            (
                ServerEvent::ForceBan {
                    banned_token: "t".to_string(),
                },
                "forceBan",
            ),
            (
                ServerEvent::AccountReactivated {
                    new_token: "t".to_string(),
                },
                "accountReactivated",
            ),
            (ServerEvent::UserListUpdated, "userListUpdated"),
            (
                ServerEvent::UserReceiveWarning {
                    message: "be nice".to_string(),
                },
                "user:receive_warning",
            ),
        ];

        for (event, name) in cases {
            let json: Value = serde_json::to_value(&event).unwrap();
            assert_eq!(json["event"], name);
        }
    }

    #[test]
    fn notification_counts_payload_is_flat() {
        let event = ServerEvent::NotificationCountsUpdated(NotificationCounts {
            users: 1,
            tickets: 2,
            bookings: 3,
            reclamations: 4,
        });

        let json: Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "notificationCountsUpdated");
        assert_eq!(json["data"]["users"], 1);
        assert_eq!(json["data"]["tickets"], 2);
        assert_eq!(json["data"]["bookings"], 3);
        assert_eq!(json["data"]["reclamations"], 4);
    }

    #[test]
    fn archive_event_omits_the_unset_flag() {
        let event = ServerEvent::TicketArchived {
            id: Uuid::new_v4(),
            archived_by_user: Some(true),
            archived_by_admin: None,
        };

        let json: Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["data"]["archivedByUser"], true);
        assert!(json["data"].get("archivedByAdmin").is_none());
    }

    #[test]
    fn force_ban_carries_banned_token_key() {
        let event = ServerEvent::ForceBan {
            banned_token: "jwt".to_string(),
        };
        let json: Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["data"]["bannedToken"], "jwt");
    }
}
