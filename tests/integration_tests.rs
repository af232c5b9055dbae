use rn2xx3::{
    config::DriverConfig,
    protocol::{FrequencyPlan, TxKind},
    DeviceError, ModuleVariant, Rn2xx3, TxStatus,
};

use mock::*;

fn create_test_device(mock: MockTransport) -> Rn2xx3<MockTransport, MockDelay> {
    Rn2xx3::new(mock, MockDelay::new(), DriverConfig::default())
}

/// Device joined by ABP, with the replies added by `script` queued after the join
fn joined_device(
    config: DriverConfig,
    script: impl FnOnce(MockTransport) -> MockTransport,
) -> Rn2xx3<MockTransport, MockDelay> {
    let mock = abp_join_replies(MockTransport::new(), RN2483_VERSION, "accepted");
    let mut device = Rn2xx3::new(script(mock), MockDelay::new(), config);
    device.join_abp(DEV_ADDR, APP_SKEY, NWK_SKEY).unwrap();
    device
}

fn uplinks(device: &Rn2xx3<MockTransport, MockDelay>) -> usize {
    device
        .transport()
        .sent()
        .iter()
        .filter(|line| line.starts_with("mac tx "))
        .count()
}

#[test]
fn test_tx_unconfirmed_sent() {
    let mock = MockTransport::new().reply("ok").reply("mac_tx_ok");
    let mut device = create_test_device(mock);

    assert_eq!(device.tx("Hello"), Ok(TxStatus::Sent));
    assert_eq!(device.transport().sent(), ["mac tx uncnf 1 48656C6C6F"]);
    // Outcome read under the network timeout, then restored
    assert_eq!(device.transport().timeouts(), [2_000, 30_000, 2_000]);
    assert!(device.take_downlink().is_none());
}

#[test]
fn test_tx_confirmed_with_downlink() {
    let mock = MockTransport::new()
        .reply("ok")
        .reply("mac_rx 1 48656C6C6F");
    let mut device = create_test_device(mock);

    assert_eq!(device.tx_cnf("Hello"), Ok(TxStatus::SentWithDownlink));
    assert_eq!(device.transport().sent(), ["mac tx cnf 1 48656C6C6F"]);

    let downlink = device.take_downlink().unwrap();
    assert_eq!(downlink.port, 1);
    assert_eq!(&downlink.decode::<16>().unwrap()[..], b"Hello");
    assert!(device.take_downlink().is_none());
}

#[test]
fn test_tx_bytes_and_port() {
    let config = DriverConfig {
        tx_port: 42,
        ..DriverConfig::default()
    };
    let mock = MockTransport::new().reply("ok").reply("mac_tx_ok");
    let mut device = Rn2xx3::new(mock, MockDelay::new(), config);

    assert_eq!(device.tx_bytes(&[0x00, 0xAB, 0xFF]), Ok(TxStatus::Sent));
    assert_eq!(device.transport().sent(), ["mac tx uncnf 42 00ABFF"]);
}

#[test]
fn test_tx_pre_encoded_payload() {
    let mock = MockTransport::new().reply("ok").reply("mac_tx_ok");
    let mut device = create_test_device(mock);

    let result = device.tx_command(TxKind::Unconfirmed, b"48656C6C6F", false);
    assert_eq!(result, Ok(TxStatus::Sent));
    assert_eq!(device.transport().sent(), ["mac tx uncnf 1 48656C6C6F"]);
}

#[test]
fn test_tx_rejects_non_ascii_pre_encoded_payload() {
    let mut device = create_test_device(MockTransport::new().reply("ok"));

    let result = device.tx_command(TxKind::Confirmed, &[0x48, 0xC3, 0xA9], false);
    assert_eq!(result, Err(DeviceError::InvalidPayload));
    assert!(device.transport().sent().is_empty());
}

#[test]
fn test_tx_rejects_line_breaks_in_pre_encoded_payload() {
    let mut device = create_test_device(MockTransport::new().reply("ok").reply("mac_tx_ok"));

    let result = device.tx_command(TxKind::Unconfirmed, b"AB\r\nmac reset", false);
    assert_eq!(result, Err(DeviceError::InvalidPayload));
    let result = device.tx_command(TxKind::Unconfirmed, b"AB CD", false);
    assert_eq!(result, Err(DeviceError::InvalidPayload));
    assert!(device.transport().sent().is_empty());
    assert_eq!(device.transport().remaining_replies(), 2);
}

#[test]
fn test_tx_unreadable_downlink_is_dropped() {
    let mock = MockTransport::new().reply("ok").reply("mac_rx x1 AB");
    let mut device = create_test_device(mock);

    assert_eq!(device.tx("Hello"), Ok(TxStatus::Sent));
    assert!(device.take_downlink().is_none());
    assert_eq!(uplinks(&device), 1);
}

#[test]
fn test_tx_drains_stale_input() {
    let mock = MockTransport::new()
        .push_stale("mac_rx 2 AA")
        .reply("ok")
        .reply("mac_tx_ok");
    let mut device = create_test_device(mock);

    assert_eq!(device.tx("Hi"), Ok(TxStatus::Sent));
    assert!(device.take_downlink().is_none());
}

#[test]
fn test_tx_busy_gives_up_after_busy_budget() {
    let mock = MockTransport::new().reply_n("busy", 12);
    let mut device = create_test_device(mock);

    assert_eq!(device.tx("Hello"), Err(DeviceError::ModuleBusy));
    assert_eq!(uplinks(&device), 10);

    let (transport, delay) = device.release();
    assert_eq!(transport.remaining_replies(), 2);
    assert_eq!(delay.calls, [1_000; 9]);
}

#[test]
fn test_tx_command_errors_are_not_retried() {
    let mut device = create_test_device(MockTransport::new().reply("invalid_param"));
    assert_eq!(device.tx("Hello"), Err(DeviceError::InvalidParam));
    assert_eq!(uplinks(&device), 1);

    let mock = MockTransport::new().reply("ok").reply("invalid_data_len");
    let mut device = create_test_device(mock);
    assert_eq!(device.tx("Hello"), Err(DeviceError::InvalidDataLength));
    assert_eq!(uplinks(&device), 1);
}

#[test]
fn test_tx_no_free_channel_waits_and_retries() {
    let mock = MockTransport::new()
        .reply("no_free_ch")
        .reply("ok")
        .reply("mac_tx_ok");
    let mut device = create_test_device(mock);

    assert_eq!(device.tx("Hello"), Ok(TxStatus::Sent));
    assert_eq!(uplinks(&device), 2);
    let (_, delay) = device.release();
    assert_eq!(delay.calls, [1_000]);
}

#[test]
fn test_tx_retries_exhausted() {
    let mock = MockTransport::new().reply_n("no_free_ch", 11);
    let mut device = create_test_device(mock);

    assert_eq!(device.tx("Hello"), Err(DeviceError::RetriesExhausted));
    assert_eq!(uplinks(&device), 10);
}

#[test]
fn test_tx_not_joined_triggers_rejoin() {
    let mut device = joined_device(DriverConfig::default(), |mock| {
        let mock = mock.reply("not_joined");
        abp_join_replies(mock, RN2483_VERSION, "accepted")
            .reply("ok")
            .reply("mac_tx_ok")
    });

    assert_eq!(device.tx("Hello"), Ok(TxStatus::Sent));
    assert_eq!(device.transport().count_sent("mac join abp"), 2);
    assert_eq!(uplinks(&device), 2);
    assert_eq!(device.transport().remaining_replies(), 0);
}

#[test]
fn test_tx_error_after_ack_triggers_rejoin() {
    let mut device = joined_device(DriverConfig::default(), |mock| {
        let mock = mock.reply("ok").reply("mac_err");
        abp_join_replies(mock, RN2483_VERSION, "accepted")
            .reply("ok")
            .reply("mac_tx_ok")
    });

    assert_eq!(device.tx("Hello"), Ok(TxStatus::Sent));
    assert_eq!(device.transport().count_sent("mac join abp"), 2);
}

#[test]
fn test_tx_rejoin_failure() {
    // Nothing was ever joined, so there are no credentials to re-join with
    let mut device = create_test_device(MockTransport::new().reply("not_joined"));
    assert_eq!(device.tx("Hello"), Err(DeviceError::RejoinFailed));
    assert_eq!(uplinks(&device), 1);

    // Timeout on the uplink outcome counts as a lost session
    let mut device = joined_device(DriverConfig::default(), |mock| {
        let mock = mock.reply("ok").reply("");
        abp_join_replies(mock, RN2483_VERSION, "denied")
    });
    assert_eq!(device.tx("Hello"), Err(DeviceError::RejoinFailed));
    assert_eq!(device.transport().count_sent("mac join abp"), 2);
}

#[test]
fn test_tx_rejoin_resets_busy_count_only() {
    let config = DriverConfig {
        max_busy: 6,
        ..DriverConfig::default()
    };
    let mut device = joined_device(config, |mock| {
        let mock = mock.reply_n("busy", 5).reply("not_joined");
        abp_join_replies(mock, RN2483_VERSION, "accepted")
            .reply_n("busy", 3)
            .reply("ok")
            .reply("mac_tx_ok")
    });

    assert_eq!(device.tx("Hello"), Ok(TxStatus::Sent));
    assert_eq!(uplinks(&device), 10);
}

#[test]
fn test_tx_attempt_budget_spans_rejoins() {
    let mut device = joined_device(DriverConfig::default(), |mut mock| {
        for _ in 0..10 {
            mock = abp_join_replies(mock.reply("not_joined"), RN2483_VERSION, "accepted");
        }
        mock.reply("ok").reply("mac_tx_ok")
    });

    assert_eq!(device.tx("Hello"), Err(DeviceError::RetriesExhausted));
    assert_eq!(uplinks(&device), 10);
    // Initial join plus a re-join after each of the first nine attempts
    assert_eq!(device.transport().count_sent("mac join abp"), 10);
}

#[test]
fn test_tx_no_rejoin_after_last_attempt() {
    let config = DriverConfig {
        max_tx_attempts: 1,
        ..DriverConfig::default()
    };
    let mut device = joined_device(config, |mock| {
        let mock = mock.reply("not_joined");
        abp_join_replies(mock, RN2483_VERSION, "accepted")
    });
    let joined = device.transport().sent().len();

    assert_eq!(device.tx("Hi"), Err(DeviceError::RetriesExhausted));
    assert_eq!(&device.transport().sent()[joined..], ["mac tx uncnf 1 4869"]);
    assert_eq!(device.transport().remaining_replies(), 12);
}

#[test]
fn test_tx_transport_fault_propagates() {
    let mut device = create_test_device(MockTransport::new().failing_reads());

    assert_eq!(
        device.tx("Hello"),
        Err(DeviceError::Transport(MockError::Fault))
    );
    assert_eq!(uplinks(&device), 1);
}

#[test]
fn test_set_data_rate() {
    let mut device = create_test_device(MockTransport::new().reply("ok"));

    device.set_data_rate(6).unwrap();
    assert!(device.transport().sent().is_empty());

    device.set_data_rate(5).unwrap();
    assert_eq!(device.transport().sent(), ["mac set dr 5"]);
}

#[test]
fn test_frequency_plan_requires_matching_module() {
    let mut device = create_test_device(MockTransport::new().reply_n("ok", 100));

    // Module not identified yet
    assert_eq!(
        device.set_frequency_plan(FrequencyPlan::TtnEu),
        Err(DeviceError::UnsupportedPlan)
    );
    assert!(device.transport().sent().is_empty());
}

#[test]
fn test_frequency_plan_on_rn2903() {
    let mock = MockTransport::new().reply(RN2903_VERSION).reply_n("ok", 72);
    let mut device = create_test_device(mock);

    assert_eq!(device.resolve(), Ok(ModuleVariant::Rn2903));
    assert_eq!(
        device.set_frequency_plan(FrequencyPlan::SingleChannelEu),
        Err(DeviceError::UnsupportedPlan)
    );
    assert_eq!(device.transport().sent().len(), 1);

    device.set_frequency_plan(FrequencyPlan::TtnUs).unwrap();
    let sent = device.transport().sent();
    assert_eq!(sent.len(), 73);
    assert_eq!(sent[1], "mac set ch status 0 off");
    assert_eq!(sent[9], "mac set ch status 8 on");
    assert_eq!(device.transport().remaining_replies(), 0);
}

#[test]
fn test_send_raw_command_trims_reply() {
    let mock = MockTransport::new()
        .push_stale("stale line")
        .reply("  RN2483 1.0.1 Dec 15 2015 09:38:09  ");
    let mut device = create_test_device(mock);

    let reply = device.send_raw_command("sys get ver").unwrap();
    assert_eq!(reply.as_str(), RN2483_VERSION);
    assert_eq!(device.transport().sent(), ["sys get ver"]);
}

#[test]
fn test_identity_queries() {
    let mock = MockTransport::new()
        .reply(RN2483_VERSION)
        .reply("0004A30B001A2B3C");
    let mut device = create_test_device(mock);

    assert_eq!(device.sysver().unwrap().as_str(), RN2483_VERSION);
    assert_eq!(device.hweui().unwrap().as_str(), "0004A30B001A2B3C");
    assert_eq!(device.transport().sent(), ["sys get ver", "sys get hweui"]);
    // Queries do not identify the module
    assert_eq!(device.module_variant(), ModuleVariant::Unknown);
}

#[test]
fn test_read_back_accessors() {
    let mock = MockTransport::new()
        .reply("5")
        .reply("0004A30B001A2B3C")
        .reply("70B3D57ED00001A6")
        .reply("0203FFEE")
        .reply("-7")
        .reply("868100000")
        .reply("3303");
    let mut device = create_test_device(mock);

    assert_eq!(device.data_rate(), Ok(5));
    assert_eq!(
        device.dev_eui(),
        Ok([0x00, 0x04, 0xA3, 0x0B, 0x00, 0x1A, 0x2B, 0x3C])
    );
    assert_eq!(device.app_eui(), Ok(APP_EUI));
    assert_eq!(device.dev_addr(), Ok(DEV_ADDR));
    assert_eq!(device.snr(), Ok(-7));
    assert_eq!(device.frequency(), Ok(868_100_000));
    assert_eq!(device.vdd(), Ok(3_303));
    assert_eq!(
        device.transport().sent(),
        [
            "mac get dr",
            "mac get deveui",
            "mac get appeui",
            "mac get devaddr",
            "radio get snr",
            "radio get freq",
            "sys get vdd",
        ]
    );
}

#[test]
fn test_read_back_rejects_unexpected_reply() {
    let mock = MockTransport::new().reply("invalid_param").reply("");
    let mut device = create_test_device(mock);

    assert_eq!(device.dev_addr(), Err(DeviceError::UnexpectedResponse));
    assert_eq!(device.vdd(), Err(DeviceError::UnexpectedResponse));
}

#[test]
fn test_sleep() {
    let mut device = create_test_device(MockTransport::new());

    device.sleep(50).unwrap();
    assert!(device.transport().sent().is_empty());

    device.sleep(60_000).unwrap();
    assert_eq!(device.transport().sent(), ["sys sleep 60000"]);
    assert_eq!(device.transport().reads(), 0);
}

#[test]
fn test_autobaud() {
    let mock = MockTransport::new().reply("").reply("").reply(RN2483_VERSION);
    let mut device = create_test_device(mock);

    device.autobaud().unwrap();
    assert_eq!(device.transport().count_sent("sys get ver"), 3);
    assert_eq!(device.transport().count_sent("\u{0}U"), 3);

    let mut device = create_test_device(MockTransport::new());
    assert_eq!(device.autobaud(), Err(DeviceError::NoResponse));
    assert_eq!(device.transport().count_sent("sys get ver"), 10);
}
