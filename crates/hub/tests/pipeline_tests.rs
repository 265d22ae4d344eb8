//! End-to-end tests for a port power run over fake USB devices
//!
//! Tests the stages in sequence, including:
//! - Power on then power off of the same port
//! - Configuration handling between locate and transfer
//! - Which failures abort the run

use common::{Error, HubIdentity, PortRequest};
use hub_port_power::Console;
use hub_port_power::testing::{FakeDevice, FakeHub, FakeSession, RecordingSleep};
use hub_port_power::usb::port_power::{REQUEST_CLEAR_FEATURE, REQUEST_SET_FEATURE};
use hub_port_power::usb::{ConfigurationOutcome, PowerPlan, switch_port_power};

fn moxa() -> HubIdentity {
    HubIdentity::new(0x110a, 0x0407, 1).unwrap()
}

#[test]
fn test_power_on_then_off_round_trip() {
    let console = Console::new("hub-port-power", true);
    let device = FakeDevice::new("moxa", 0x110a, 0x0407);
    let hub = device.hub();
    let session = FakeSession::repeating(vec![FakeDevice::new("mouse", 0x046d, 0xc077), device]);
    let mut sleeper = RecordingSleep::default();

    let on = PortRequest::new(3, true).unwrap();
    switch_port_power(
        &session,
        &moxa(),
        &on,
        &PowerPlan::default(),
        &mut sleeper,
        &console,
    )
    .unwrap();

    let off = PortRequest::new(3, false).unwrap();
    switch_port_power(
        &session,
        &moxa(),
        &off,
        &PowerPlan::default(),
        &mut sleeper,
        &console,
    )
    .unwrap();

    let transfers = hub.transfers();
    assert_eq!(transfers.len(), 2);
    assert_eq!(transfers[0].request, REQUEST_SET_FEATURE);
    assert_eq!(transfers[1].request, REQUEST_CLEAR_FEATURE);
    for transfer in &transfers {
        assert_eq!(transfer.value, 8);
        assert_eq!(transfer.index, 3);
    }
    assert!(sleeper.sleeps.is_empty());
}

#[test]
fn test_configuration_set_when_different() {
    let console = Console::new("hub-port-power", true);
    let hub = FakeHub::new("moxa").with_configuration(Ok(0));
    let device = FakeDevice::new("moxa", 0x110a, 0x0407).with_hub(hub.clone());
    let session = FakeSession::repeating(vec![device]);

    let report = switch_port_power(
        &session,
        &moxa(),
        &PortRequest::new(1, true).unwrap(),
        &PowerPlan::default(),
        RecordingSleep::default(),
        &console,
    )
    .unwrap();

    assert_eq!(report.configuration, ConfigurationOutcome::Applied);
    assert_eq!(hub.set_configuration_calls(), vec![1]);
    assert_eq!(hub.configuration(), Ok(1));
}

#[test]
fn test_configuration_untouched_when_already_set() {
    let console = Console::new("hub-port-power", true);
    let device = FakeDevice::new("moxa", 0x110a, 0x0407);
    let hub = device.hub();
    let session = FakeSession::repeating(vec![device]);

    let report = switch_port_power(
        &session,
        &moxa(),
        &PortRequest::new(1, true).unwrap(),
        &PowerPlan::default(),
        RecordingSleep::default(),
        &console,
    )
    .unwrap();

    assert_eq!(report.configuration, ConfigurationOutcome::Unchanged);
    assert!(hub.set_configuration_calls().is_empty());
}

#[test]
fn test_configuration_failure_does_not_abort() {
    let console = Console::new("hub-port-power", true);
    let hub = FakeHub::new("moxa")
        .with_configuration(Ok(2))
        .with_set_configuration_result(Err(rusb::Error::Busy));
    let device = FakeDevice::new("moxa", 0x110a, 0x0407).with_hub(hub.clone());
    let session = FakeSession::repeating(vec![device]);

    let report = switch_port_power(
        &session,
        &moxa(),
        &PortRequest::new(5, false).unwrap(),
        &PowerPlan::default(),
        RecordingSleep::default(),
        &console,
    )
    .unwrap();

    assert_eq!(
        report.configuration,
        ConfigurationOutcome::Failed(rusb::Error::Busy)
    );
    assert_eq!(hub.set_configuration_calls(), vec![1]);
    assert_eq!(hub.transfers().len(), 1);
}

#[test]
fn test_missing_hub_skips_later_stages() {
    let console = Console::new("hub-port-power", true);
    let other = FakeDevice::new("other-hub", 0x0424, 0x2514);
    let other_hub = other.hub();
    let session = FakeSession::repeating(vec![other]);

    let err = switch_port_power(
        &session,
        &moxa(),
        &PortRequest::new(1, true).unwrap(),
        &PowerPlan::default(),
        RecordingSleep::default(),
        &console,
    )
    .unwrap_err();

    assert_eq!(err.stage(), "device locator");
    assert!(other_hub.transfers().is_empty());
    assert!(other_hub.set_configuration_calls().is_empty());
}

#[test]
fn test_transfer_failure_is_fatal() {
    let console = Console::new("hub-port-power", true);
    let hub = FakeHub::new("moxa").with_transfer_outcomes(vec![Err(rusb::Error::NoDevice)]);
    let device = FakeDevice::new("moxa", 0x110a, 0x0407).with_hub(hub);
    let session = FakeSession::repeating(vec![device]);

    let err = switch_port_power(
        &session,
        &moxa(),
        &PortRequest::new(1, true).unwrap(),
        &PowerPlan::default(),
        RecordingSleep::default(),
        &console,
    )
    .unwrap_err();

    assert!(matches!(err, Error::Transfer { port: 1, attempts: 1, .. }));
}
