mod common;
use common::*;
use export_limiter::prelude::*;

use export_limiter::solaredge::inverter::Inverter;
use std::sync::Mutex;

fn device_with_defaults() -> Arc<Mutex<FakeDevice>> {
    let device = Arc::new(Mutex::new(FakeDevice::default()));
    {
        let mut d = device.lock().unwrap();
        d.set_holding(40083, vec![700, 1]);
        d.set_holding(61762, vec![0, 0]);
        d.set_holding(0xF304, vec![0xC000, 0x45DA]);
    }
    device
}

fn inverter(device: &Arc<Mutex<FakeDevice>>) -> Inverter {
    Inverter::new(Arc::new(FakeConnector::new(device.clone())))
}

#[tokio::test]
async fn connect_and_read() -> Result<()> {
    let device = device_with_defaults();
    let mut subject = inverter(&device);

    assert!(!subject.is_connected());
    subject.connect().await?;
    assert!(subject.is_connected());

    assert_eq!(subject.read_inverter_power().await?, 7000.0);
    assert_eq!(subject.read_max_active_power().await?, 7000.0);
    assert!(!subject.read_control_enabled().await?);

    Ok(())
}

#[tokio::test]
async fn explicit_disconnect() -> Result<()> {
    let device = device_with_defaults();
    let mut subject = inverter(&device);
    subject.connect().await?;

    subject.disconnect();

    assert!(!subject.is_connected());
    let err = subject.read_inverter_power().await.unwrap_err();
    assert!(matches!(err, DeviceError::NotConnected));

    Ok(())
}

#[tokio::test]
async fn refused_connect() {
    let device = device_with_defaults();
    device.lock().unwrap().fail_connect = true;
    let mut subject = inverter(&device);

    let err = subject.connect().await.unwrap_err();

    assert!(matches!(err, ConnectionError::Refused { .. }));
    assert!(!subject.is_connected());
}

#[tokio::test]
async fn read_without_connect() {
    let device = device_with_defaults();
    let mut subject = inverter(&device);

    let err = subject.read_inverter_power().await.unwrap_err();

    assert!(matches!(err, DeviceError::NotConnected));
}

#[tokio::test]
async fn io_error_drops_session() -> Result<()> {
    let device = device_with_defaults();
    let mut subject = inverter(&device);
    subject.connect().await?;

    device.lock().unwrap().fail_reads = true;

    let err = subject.read_inverter_power().await.unwrap_err();
    assert!(matches!(err, DeviceError::Io(_)));
    assert!(!subject.is_connected());

    // Until the caller reconnects, every call is refused locally.
    let err = subject.read_inverter_power().await.unwrap_err();
    assert!(matches!(err, DeviceError::NotConnected));

    Ok(())
}

#[tokio::test]
async fn short_response_drops_session() -> Result<()> {
    let device = device_with_defaults();
    device.lock().unwrap().set_holding(40083, vec![700]);
    let mut subject = inverter(&device);
    subject.connect().await?;

    let err = subject.read_inverter_power().await.unwrap_err();

    assert!(matches!(
        err,
        DeviceError::ShortResponse {
            register: 40083,
            expected: 2,
            got: 1,
        }
    ));
    assert!(!subject.is_connected());

    Ok(())
}

#[tokio::test]
async fn reconnect_after_failure() -> Result<()> {
    let device = device_with_defaults();
    let mut subject = inverter(&device);
    subject.connect().await?;

    device.lock().unwrap().fail_reads = true;
    assert!(subject.read_inverter_power().await.is_err());

    device.lock().unwrap().fail_reads = false;
    subject.connect().await?;

    assert_eq!(subject.read_inverter_power().await?, 7000.0);
    assert_eq!(device.lock().unwrap().connects, 2);

    Ok(())
}

#[tokio::test]
async fn write_failure_drops_session() -> Result<()> {
    let device = device_with_defaults();
    let mut subject = inverter(&device);
    subject.connect().await?;

    device.lock().unwrap().fail_writes = true;

    let err = subject.set_power_limit_percent(90).await.unwrap_err();
    assert!(matches!(err, DeviceError::Io(_)));
    assert!(!subject.is_connected());

    Ok(())
}

#[tokio::test]
async fn power_limit_is_clamped() -> Result<()> {
    let device = device_with_defaults();
    let mut subject = inverter(&device);
    subject.connect().await?;

    subject.set_power_limit_percent(150).await?;
    subject.set_power_limit_percent(42).await?;

    assert_eq!(
        device.lock().unwrap().writes,
        vec![(61441, vec![100]), (61441, vec![42])]
    );

    Ok(())
}

#[tokio::test]
async fn enable_writes_both_words() -> Result<()> {
    let device = device_with_defaults();
    let mut subject = inverter(&device);
    subject.connect().await?;

    subject.set_control_enabled(true).await?;
    assert!(subject.read_control_enabled().await?);

    assert_eq!(device.lock().unwrap().writes, vec![(61762, vec![0, 1])]);

    Ok(())
}

#[tokio::test]
async fn exception_drops_session() -> Result<()> {
    let device = Arc::new(Mutex::new(FakeDevice::default()));
    let mut subject = inverter(&device);
    subject.connect().await?;

    let err = subject.read_control_enabled().await.unwrap_err();

    assert!(matches!(err, DeviceError::Exception(_)));
    assert!(!subject.is_connected());

    Ok(())
}
