//! ESP-NOW Modbus Bridge Main Application
//!
//! Entry point for the ESP32 firmware. Brings up the Wi-Fi radio in
//! ESP-NOW mode, the Modbus UART and the status LED, then spawns the single
//! task the boot mode asks for. The embassy executor runs on the PRO core
//! (core 0), so that is where the bridge task lives.

#![no_std]
#![no_main]

use core::cell::Cell;

use defmt::{error, info, warn};
use embassy_executor::{SpawnError, Spawner};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use esp_backtrace as _;
use esp_hal::efuse::Efuse;
use esp_hal::gpio::{Level, Output};
use esp_hal::peripherals::WIFI;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::uart::{self, Uart, UartRx, UartTx};
use esp_hal::Async;
use esp_println as _;
use esp_wifi::esp_now::{self, EspNow, EspNowError, EspNowManager, EspNowReceiver, EspNowSender, PeerInfo};
use esp_wifi::EspWifiController;
use static_cell::StaticCell;

use espnow_modbus_bridge::prelude::*;

/// Radio context shared by the transport and the pump tasks
static RADIO_CONTEXT: RadioContext = RadioContext::new();

/// Callbacks registered by the transport, read by the pump tasks
static CALLBACKS: Mutex<CriticalSectionRawMutex, Cell<Option<RadioCallbacks<'static>>>> =
    Mutex::new(Cell::new(None));

/// Datagrams accepted by `EspNowRadio::send`, drained by the TX pump
static RADIO_TX: Channel<CriticalSectionRawMutex, Datagram, RADIO_TX_QUEUE_SIZE> = Channel::new();

static WIFI_CONTROLLER: StaticCell<EspWifiController<'static>> = StaticCell::new();

/// Outbound datagram waiting for the ESP-NOW stack
struct Datagram {
    peer: PeerAddress,
    payload: Payload,
}

/// ESP-NOW stack behind the `RadioDriver` boundary
struct EspNowRadio {
    controller: &'static EspWifiController<'static>,
    wifi: Option<WIFI>,
    spawner: Spawner,
    manager: Option<EspNowManager<'static>>,
}

impl EspNowRadio {
    fn new(controller: &'static EspWifiController<'static>, wifi: WIFI, spawner: Spawner) -> Self {
        Self {
            controller,
            wifi: Some(wifi),
            spawner,
            manager: None,
        }
    }

    fn manager(&self) -> Result<&EspNowManager<'static>, DriverError> {
        self.manager.as_ref().ok_or(DriverError::NotStarted)
    }
}

fn driver_error(e: EspNowError) -> DriverError {
    match e {
        EspNowError::Error(esp_now::Error::PeerListFull) => DriverError::PeerTableFull,
        EspNowError::Error(esp_now::Error::PeerExists) => DriverError::PeerExists,
        EspNowError::Error(esp_now::Error::NotFound) => DriverError::PeerNotFound,
        EspNowError::Error(esp_now::Error::NotInitialized) => DriverError::NotStarted,
        _ => DriverError::Other(-1),
    }
}

impl RadioDriver<'static> for EspNowRadio {
    fn start(&mut self) -> Result<(), DriverError> {
        let wifi = self.wifi.take().ok_or(DriverError::NotStarted)?;
        let esp_now = EspNow::new(self.controller, wifi).map_err(|_| DriverError::NotStarted)?;
        if let Ok(version) = esp_now.version() {
            info!("esp-now version {}", version);
        }

        let (manager, sender, receiver) = esp_now.split();
        self.spawner
            .spawn(radio_tx_pump(sender))
            .map_err(|_| DriverError::NotStarted)?;
        self.spawner
            .spawn(radio_rx_pump(receiver))
            .map_err(|_| DriverError::NotStarted)?;
        self.manager = Some(manager);
        Ok(())
    }

    fn register_callbacks(&mut self, callbacks: RadioCallbacks<'static>) -> Result<(), DriverError> {
        CALLBACKS.lock(|cell| cell.set(Some(callbacks)));
        Ok(())
    }

    fn unregister_callbacks(&mut self) {
        CALLBACKS.lock(|cell| cell.set(None));
    }

    fn set_primary_key(&mut self, key: &CipherKey) -> Result<(), DriverError> {
        self.manager()?.set_pmk(key.as_bytes()).map_err(driver_error)
    }

    fn add_peer(&mut self, entry: &PeerEntry) -> Result<(), DriverError> {
        let info = PeerInfo {
            peer_address: entry.address.octets(),
            lmk: entry.key.map(|key| *key.as_bytes()),
            channel: (entry.channel != 0).then_some(entry.channel),
            encrypt: entry.encrypted,
        };
        self.manager()?.add_peer(info).map_err(driver_error)
    }

    fn peer_exists(&self, peer: PeerAddress) -> bool {
        self.manager
            .as_ref()
            .is_some_and(|manager| manager.peer_exists(&peer.octets()))
    }

    fn send(&mut self, peer: PeerAddress, payload: &[u8]) -> Result<(), DriverError> {
        self.manager()?;
        let payload = Payload::from_slice(payload).map_err(|()| DriverError::Other(-1))?;
        RADIO_TX
            .try_send(Datagram { peer, payload })
            .map_err(|_| DriverError::Busy)
    }

    fn stop(&mut self) {
        self.manager = None;
        RADIO_TX.clear();
        warn!("esp-now stopped");
    }
}

/// Send-completion context: pushes queued datagrams through the stack
#[embassy_executor::task]
async fn radio_tx_pump(mut sender: EspNowSender<'static>) {
    loop {
        let datagram = RADIO_TX.receive().await;
        let delivered = sender
            .send_async(&datagram.peer.octets(), &datagram.payload)
            .await
            .is_ok();
        if let Some(callbacks) = CALLBACKS.lock(Cell::get) {
            callbacks.on_send_complete(datagram.peer, SendStatus::from(delivered));
        }
    }
}

/// Receive context: hands every datagram to the registered callbacks
#[embassy_executor::task]
async fn radio_rx_pump(mut receiver: EspNowReceiver<'static>) {
    loop {
        let received = receiver.receive_async().await;
        if let Some(callbacks) = CALLBACKS.lock(Cell::get) {
            callbacks.on_receive(&received.info.src_address, received.data());
        }
    }
}

type Transport = RadioTransport<'static, EspNowRadio>;

/// Everything the selected mode task takes ownership of
struct Resources {
    transport: Transport,
    led: StatusLed<Output<'static>>,
    uart_rx: UartRx<'static, Async>,
    uart_tx: UartTx<'static, Async>,
    config: BridgeConfig,
}

/// Why the mode task could not be spawned
#[derive(defmt::Format)]
enum TaskError {
    AlreadySpawned,
    Spawn(SpawnError),
}

/// Mode spawner over the embassy executor
struct BridgeTasks {
    spawner: Spawner,
    resources: Option<Resources>,
}

impl ModeSpawner for BridgeTasks {
    type Error = TaskError;

    fn spawn_modbus_bridge(&mut self) -> Result<(), TaskError> {
        let r = self.resources.take().ok_or(TaskError::AlreadySpawned)?;
        let bridge = SerialBridge::new(r.transport, r.led, r.config);
        self.spawner
            .spawn(modbus_communication(bridge, r.uart_rx, r.uart_tx))
            .map_err(TaskError::Spawn)
    }

    fn spawn_radio_echo(&mut self) -> Result<(), TaskError> {
        let r = self.resources.take().ok_or(TaskError::AlreadySpawned)?;
        let echo = EchoResponder::new(r.transport, r.led, r.config);
        self.spawner
            .spawn(espnow_communication(echo))
            .map_err(TaskError::Spawn)
    }
}

/// Modbus-over-radio mode
#[embassy_executor::task]
async fn modbus_communication(
    mut bridge: SerialBridge<'static, EspNowRadio, Output<'static>>,
    mut rx: UartRx<'static, Async>,
    mut tx: UartTx<'static, Async>,
) {
    bridge.run(&mut rx, &mut tx).await
}

/// Radio echo mode
#[embassy_executor::task]
async fn espnow_communication(mut echo: EchoResponder<'static, EspNowRadio, Output<'static>>) {
    echo.run().await
}

/// Main entry point
#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    info!("ESP-NOW Modbus bridge v{}", env!("CARGO_PKG_VERSION"));

    let peripherals = esp_hal::init(esp_hal::Config::default());
    esp_alloc::heap_allocator!(HEAP_SIZE);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let timg1 = TimerGroup::new(peripherals.TIMG1);
    esp_hal_embassy::init(timg1.timer0);

    let controller = match esp_wifi::init(timg0.timer0, Rng::new(peripherals.RNG), peripherals.RADIO_CLK) {
        Ok(controller) => WIFI_CONTROLLER.init(controller),
        Err(_) => defmt::panic!("wifi init failed"),
    };
    info!("Started Wifi");
    info!("MAC address {}", PeerAddress::new(Efuse::read_base_mac_address()));

    let config = BridgeConfig::default();
    let radio = EspNowRadio::new(controller, peripherals.WIFI, spawner);
    let transport = match RadioTransport::initialize(radio, &RADIO_CONTEXT, &config.primary_key) {
        Ok(transport) => transport,
        Err(e) => defmt::panic!("radio init failed: {}", e),
    };
    Timer::after(Duration::from_millis(STARTUP_SETTLE_MS)).await;

    let uart_config = uart::Config {
        baudrate: config.uart.baud_rate,
        ..uart::Config::default()
    };
    let uart = match Uart::new(peripherals.UART2, uart_config) {
        Ok(uart) => uart
            .with_tx(peripherals.GPIO17)
            .with_rx(peripherals.GPIO16)
            .into_async(),
        Err(_) => defmt::panic!("uart config rejected"),
    };
    let (uart_rx, uart_tx) = uart.split();
    info!("Started uart {}", config.uart);
    Timer::after(Duration::from_millis(STARTUP_SETTLE_MS)).await;

    let led = StatusLed::new(Output::new(peripherals.GPIO2, Level::Low));
    info!("Started GPIO");

    let mut tasks = BridgeTasks {
        spawner,
        resources: Some(Resources {
            transport,
            led,
            uart_rx,
            uart_tx,
            config,
        }),
    };
    if let Err(e) = dispatch(BOOT_MODE, &mut tasks) {
        error!("{} task not started: {}", BOOT_MODE, e);
    }
}
