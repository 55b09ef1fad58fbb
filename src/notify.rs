use serde::{Deserialize, Serialize};

use crate::hooks::{HookEffect, Notification, TransitionHook};
use crate::workflow::{Status, StatusChange};

/// A user's request to hear about any puzzle entering `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSubscription {
    pub user: String,
    #[serde(default)]
    pub email: String,
    pub status: Status,
}

pub fn subject_for(change: &StatusChange) -> String {
    format!(
        "{} entered status {}",
        change.puzzle_title,
        change.to.display_name()
    )
}

/// Produces one notification per change for everyone subscribed to the new
/// status. Subscribers without an email address are skipped.
pub struct SubscriptionNotifier<'a> {
    subscriptions: &'a [StatusSubscription],
}

impl<'a> SubscriptionNotifier<'a> {
    pub fn new(subscriptions: &'a [StatusSubscription]) -> Self {
        Self { subscriptions }
    }

    pub fn recipients(&self, status: Status) -> Vec<String> {
        let mut emails: Vec<String> = self
            .subscriptions
            .iter()
            .filter(|s| s.status == status && !s.email.is_empty())
            .map(|s| s.email.clone())
            .collect();
        emails.sort();
        emails.dedup();
        emails
    }
}

impl TransitionHook for SubscriptionNotifier<'_> {
    fn name(&self) -> &'static str {
        "subscription_notifier"
    }

    fn on_status_change(&mut self, change: &StatusChange) -> Vec<HookEffect> {
        let recipients = self.recipients(change.to);
        if recipients.is_empty() {
            return Vec::new();
        }
        vec![HookEffect::Notify(Notification {
            puzzle_id: change.puzzle_id,
            subject: subject_for(change),
            recipients,
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sub(user: &str, email: &str, status: Status) -> StatusSubscription {
        StatusSubscription {
            user: user.into(),
            email: email.into(),
            status,
        }
    }

    fn change(to: Status) -> StatusChange {
        StatusChange {
            puzzle_id: 5,
            puzzle_title: "Puzzle 5: (ORCA)".into(),
            from: Status::NeedsSolution,
            to,
            actor: "a".into(),
            at: Utc::now(),
        }
    }

    #[test]
    fn notifies_subscribers_of_new_status() {
        let subs = vec![
            sub("pat", "pat@example.com", Status::NeedsPostprod),
            sub("quinn", "", Status::NeedsPostprod),
            sub("rae", "rae@example.com", Status::Done),
        ];
        let entered = change(Status::NeedsPostprod);
        let effects = SubscriptionNotifier::new(&subs).on_status_change(&entered);

        assert_eq!(
            effects,
            vec![HookEffect::Notify(Notification {
                puzzle_id: 5,
                subject: "Puzzle 5: (ORCA) entered status Needs postprod".into(),
                recipients: vec!["pat@example.com".into()],
            })]
        );
    }

    #[test]
    fn no_recipients_means_no_notification() {
        let subs = vec![sub("quinn", "", Status::Done)];
        let effects = SubscriptionNotifier::new(&subs).on_status_change(&change(Status::Done));
        assert!(effects.is_empty());
    }
}
