//! Integration tests for the device locator
//!
//! Tests hub resolution against scripted device lists, including:
//! - Instance counting from the end of the list
//! - Retry passes and the delay between them
//! - Descriptor, enumeration and open failures

use common::{Error, HubIdentity};
use hub_port_power::Console;
use hub_port_power::testing::{FakeDevice, FakeSession, RecordingSleep};
use hub_port_power::usb::{DeviceLocator, LocatorPolicy};
use std::time::Duration;

const VID: u16 = 0x110a;
const PID: u16 = 0x0407;

fn console() -> Console {
    Console::new("hub-port-power", true)
}

fn identity(instance: u8) -> HubIdentity {
    HubIdentity::new(VID, PID, instance).unwrap()
}

/// hub-a, mouse, hub-b, keyboard, hub-c
fn mixed_list() -> Vec<FakeDevice> {
    vec![
        FakeDevice::new("hub-a", VID, PID),
        FakeDevice::new("mouse", 0x046d, 0xc077),
        FakeDevice::new("hub-b", VID, PID),
        FakeDevice::new("keyboard", 0x04d9, 0x1603),
        FakeDevice::new("hub-c", VID, PID),
    ]
}

mod instance_selection {
    use super::*;

    #[test]
    fn test_instance_counts_from_end_of_list() {
        let console = console();
        let session = FakeSession::repeating(mixed_list());

        for (instance, label, entry) in [(1, "hub-c", 5), (2, "hub-b", 3), (3, "hub-a", 1)] {
            let mut locator =
                DeviceLocator::new(LocatorPolicy::default(), RecordingSleep::default(), &console);
            let found = locator.locate(&session, &identity(instance)).unwrap();

            assert_eq!(found.handle.label(), label, "instance {}", instance);
            assert_eq!(found.entry, entry);
            assert_eq!(found.list_len, 5);
            assert_eq!(found.pass, 0);
        }
    }

    #[test]
    fn test_instance_beyond_matches_not_found() {
        let console = console();
        let session = FakeSession::repeating(mixed_list());
        let mut locator =
            DeviceLocator::new(LocatorPolicy::default(), RecordingSleep::default(), &console);

        let err = locator.locate(&session, &identity(4)).unwrap_err();
        assert!(matches!(
            err,
            Error::DeviceNotFound {
                vendor_id: VID,
                product_id: PID,
                instance: 4,
                passes: 2,
            }
        ));
    }

    #[test]
    fn test_stops_at_first_match_for_instance() {
        let console = console();
        // hub-a can't be opened, but instance 1 is hub-b, so hub-a is never tried
        let session = FakeSession::repeating(vec![
            FakeDevice::new("hub-a", VID, PID).with_open_error(rusb::Error::Access),
            FakeDevice::new("hub-b", VID, PID),
        ]);
        let mut locator =
            DeviceLocator::new(LocatorPolicy::default(), RecordingSleep::default(), &console);

        let found = locator.locate(&session, &identity(1)).unwrap();
        assert_eq!(found.handle.label(), "hub-b");
    }
}

mod retry_passes {
    use super::*;

    #[test]
    fn test_not_found_after_all_passes_with_delay() {
        let console = console();
        let session = FakeSession::repeating(vec![FakeDevice::new("mouse", 0x046d, 0xc077)]);
        let mut locator =
            DeviceLocator::new(LocatorPolicy::default(), RecordingSleep::default(), &console);

        let err = locator.locate(&session, &identity(1)).unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound { passes: 2, .. }));
        assert_eq!(session.enumerations(), 2);
        assert_eq!(locator.sleeper().sleeps, vec![Duration::from_secs(4)]);
    }

    #[test]
    fn test_custom_pass_count() {
        let console = console();
        let session = FakeSession::repeating(Vec::new());
        let policy = LocatorPolicy {
            passes: 4,
            retry_delay: Duration::from_millis(250),
        };
        let mut locator = DeviceLocator::new(policy, RecordingSleep::default(), &console);

        assert!(locator.locate(&session, &identity(1)).is_err());
        assert_eq!(session.enumerations(), 4);
        assert_eq!(
            locator.sleeper().sleeps,
            vec![Duration::from_millis(250); 3]
        );
    }

    #[test]
    fn test_hub_appearing_on_second_pass() {
        let console = console();
        let session = FakeSession::scripted(
            vec![Ok(vec![FakeDevice::new("mouse", 0x046d, 0xc077)])],
            Ok(vec![
                FakeDevice::new("mouse", 0x046d, 0xc077),
                FakeDevice::new("late-hub", VID, PID),
            ]),
        );
        let mut locator =
            DeviceLocator::new(LocatorPolicy::default(), RecordingSleep::default(), &console);

        let found = locator.locate(&session, &identity(1)).unwrap();
        assert_eq!(found.handle.label(), "late-hub");
        assert_eq!(found.pass, 1);
        assert_eq!(locator.sleeper().sleeps.len(), 1);
    }

    #[test]
    fn test_device_list_failure_skips_to_next_pass() {
        let console = console();
        let session = FakeSession::scripted(
            vec![Err(rusb::Error::NoMem)],
            Ok(vec![FakeDevice::new("hub", VID, PID)]),
        );
        let mut locator =
            DeviceLocator::new(LocatorPolicy::default(), RecordingSleep::default(), &console);

        let found = locator.locate(&session, &identity(1)).unwrap();
        assert_eq!(found.pass, 1);
        assert_eq!(session.enumerations(), 2);
    }

    #[test]
    fn test_open_failure_fails_the_pass_not_the_run() {
        let console = console();
        let session = FakeSession::scripted(
            vec![Ok(vec![
                FakeDevice::new("busy-hub", VID, PID).with_open_error(rusb::Error::Busy),
            ])],
            Ok(vec![FakeDevice::new("hub", VID, PID)]),
        );
        let mut locator =
            DeviceLocator::new(LocatorPolicy::default(), RecordingSleep::default(), &console);

        let found = locator.locate(&session, &identity(1)).unwrap();
        assert_eq!(found.handle.label(), "hub");
        assert_eq!(found.pass, 1);
    }

    #[test]
    fn test_open_failure_on_every_pass_is_not_found() {
        let console = console();
        let session = FakeSession::repeating(vec![
            FakeDevice::new("hub", VID, PID).with_open_error(rusb::Error::Access),
        ]);
        let mut locator =
            DeviceLocator::new(LocatorPolicy::default(), RecordingSleep::default(), &console);

        let err = locator.locate(&session, &identity(1)).unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound { .. }));
        assert_eq!(session.enumerations(), 2);
    }
}

mod descriptor_failures {
    use super::*;

    #[test]
    fn test_unreadable_descriptor_does_not_abort_scan() {
        let console = console();
        let session = FakeSession::repeating(vec![
            FakeDevice::new("hub", VID, PID),
            FakeDevice::unreadable("broken", rusb::Error::Io),
        ]);
        let mut locator =
            DeviceLocator::new(LocatorPolicy::default(), RecordingSleep::default(), &console);

        let found = locator.locate(&session, &identity(1)).unwrap();
        assert_eq!(found.handle.label(), "hub");
        assert_eq!(found.pass, 0);
    }

    #[test]
    fn test_unreadable_descriptor_is_not_counted_as_match() {
        let console = console();
        let session = FakeSession::repeating(vec![
            FakeDevice::new("hub-a", VID, PID),
            FakeDevice::unreadable("broken", rusb::Error::Io),
            FakeDevice::new("hub-b", VID, PID),
        ]);
        let mut locator =
            DeviceLocator::new(LocatorPolicy::default(), RecordingSleep::default(), &console);

        let found = locator.locate(&session, &identity(2)).unwrap();
        assert_eq!(found.handle.label(), "hub-a");
    }
}
