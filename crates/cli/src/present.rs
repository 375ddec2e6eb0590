// Text rendering of a LifecycleView.

use std::io::{self, Write};

use chrono::FixedOffset;
use unfollowers_core::{LifecycleView, PassStatus};

pub const TITLE: &str = "Recent Unfollowers";

/// Render `view` the way a human reads it. Dates and the update time are
/// shown in `offset`.
pub fn render_view(view: &LifecycleView, offset: FixedOffset, out: &mut impl Write) -> io::Result<()> {
    match view.status {
        PassStatus::Idle => {
            writeln!(out, "Waiting for identity")?;
        }
        PassStatus::Loading => {
            writeln!(out, "Loading...")?;
            writeln!(out, "Fetching unfollower data")?;
        }
        PassStatus::Error => {
            writeln!(out, "Error")?;
            writeln!(out, "{}", view.error_message.as_deref().unwrap_or_default())?;
        }
        PassStatus::Ready => {
            let Some(result) = &view.result else {
                return Ok(());
            };
            writeln!(out, "{}", TITLE)?;
            writeln!(out, "Last {} users who unfollowed you", result.limit)?;
            if result.is_empty() {
                writeln!(out, "  (none)")?;
            }
            // `{:<width$}` pads by chars, so measure in chars too
            let width = result.iter().map(|u| u.handle.chars().count() + 1).max().unwrap_or(0);
            for user in result.iter() {
                let handle = format!("@{}", user.handle);
                let date = user.observed_at.with_timezone(&offset).format("%Y-%m-%d");
                writeln!(out, "  {:<width$}  {}", handle, date, width = width)?;
            }
            if let Some(at) = view.updated_at {
                writeln!(out)?;
                writeln!(out, "Updated: {}", at.with_timezone(&offset).format("%H:%M:%S"))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use unfollowers_recon::{Identity, ReconciliationResult, UnfollowerRecord};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn base_view(status: PassStatus) -> LifecycleView {
        LifecycleView {
            status,
            identity: Some(Identity(3)),
            result: None,
            error_message: None,
            added: false,
            add_frame_requested: false,
            add_frame_rejected: None,
            notifications_enabled: false,
            updated_at: None,
        }
    }

    fn render(view: &LifecycleView) -> String {
        let mut buf = Vec::new();
        render_view(view, utc(), &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_ready_lists_handles_and_dates() {
        let mut view = base_view(PassStatus::Ready);
        view.result = Some(ReconciliationResult {
            identity: Some(Identity(3)),
            limit: 5,
            unfollowers: vec![
                UnfollowerRecord {
                    id: 2,
                    handle: "bob".into(),
                    display_name: None,
                    observed_at: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
                },
                UnfollowerRecord {
                    id: 4,
                    handle: "carolyn".into(),
                    display_name: Some("Carolyn".into()),
                    observed_at: Utc.with_ymd_and_hms(2026, 1, 2, 8, 0, 0).unwrap(),
                },
            ],
        });
        view.updated_at = Some(Utc.with_ymd_and_hms(2026, 1, 16, 9, 5, 7).unwrap());

        let text = render(&view);
        assert_eq!(
            text,
            "Recent Unfollowers\n\
             Last 5 users who unfollowed you\n  \
             @bob      2026-01-15\n  \
             @carolyn  2026-01-02\n\
             \n\
             Updated: 09:05:07\n"
        );
    }

    #[test]
    fn test_non_ascii_handles_align() {
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let mut view = base_view(PassStatus::Ready);
        view.result = Some(ReconciliationResult {
            identity: Some(Identity(3)),
            limit: 5,
            unfollowers: ["zoë", "ab"]
                .iter()
                .enumerate()
                .map(|(i, handle)| UnfollowerRecord {
                    id: i as u64,
                    handle: handle.to_string(),
                    display_name: None,
                    observed_at: at,
                })
                .collect(),
        });

        let text = render(&view);
        let rows: Vec<&str> = text.lines().filter(|l| l.starts_with("  @")).collect();
        assert_eq!(rows, vec!["  @zoë  2026-01-15", "  @ab   2026-01-15"]);
    }

    #[test]
    fn test_ready_empty() {
        let mut view = base_view(PassStatus::Ready);
        view.result = Some(ReconciliationResult::empty(5));
        let text = render(&view);
        assert!(text.contains("Last 5 users who unfollowed you"));
        assert!(text.contains("(none)"));
    }

    #[test]
    fn test_error_shows_only_generic_message() {
        let mut view = base_view(PassStatus::Error);
        view.error_message = Some("failed to fetch relationship data".into());
        assert_eq!(render(&view), "Error\nfailed to fetch relationship data\n");
    }

    #[test]
    fn test_loading_and_idle() {
        assert!(render(&base_view(PassStatus::Loading)).starts_with("Loading..."));
        assert_eq!(render(&base_view(PassStatus::Idle)), "Waiting for identity\n");
    }
}
