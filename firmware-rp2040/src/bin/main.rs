#![no_std]
#![no_main]

use defmt::{error, info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART1;
use embassy_rp::uart::{Config as UartConfig, Uart};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Sender};
use embassy_time::{Duration, Instant, Ticker};
use glasses_rp2040::{
    pump, ChannelByteSource, ControlPlane, SceneChange, StatusLedHost, UartByteSource,
    BYTE_QUEUE_DEPTH, DEFAULT_CONFIG,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART1_IRQ => embassy_rp::uart::InterruptHandler<UART1>;
});

/// Control loop period.
const TICK_PERIOD: Duration = Duration::from_millis(16);

/// Largest chunk handed to the parser per read.
const CHUNK_SIZE: usize = 32;

type ByteQueue = Channel<CriticalSectionRawMutex, u8, BYTE_QUEUE_DEPTH>;

/// Bytes received on the command link, waiting for the control task.
static BYTE_QUEUE: StaticCell<ByteQueue> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Glasses control plane starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    let queue: &'static ByteQueue = BYTE_QUEUE.init(Channel::new());

    // --- UART Setup ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = 115_200;

    #[cfg(not(feature = "uart-flow-control"))]
    let uart = Uart::new(
        p.UART1,
        p.PIN_8, // TX
        p.PIN_9, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    #[cfg(feature = "uart-flow-control")]
    let uart = Uart::new_with_rtscts(
        p.UART1,
        p.PIN_8,  // TX
        p.PIN_9,  // RX
        p.PIN_11, // RTS
        p.PIN_10, // CTS
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    let (_tx, rx) = uart.split();
    let uart_input = UartByteSource::new(rx);

    // On-board LED on Pico
    let led = Output::new(p.PIN_25, Level::Low);
    let plane = ControlPlane::new(DEFAULT_CONFIG, StatusLedHost::new(led));

    // Mode button to ground, active low
    let mode_button = Input::new(p.PIN_4, Pull::Up);

    // Spawn tasks (spawn, then unwrap the spawn result)
    spawner.spawn(uart_task(uart_input, queue.sender())).unwrap();
    spawner
        .spawn(control_task(
            plane,
            ChannelByteSource::new(queue.receiver()),
            mode_button,
        ))
        .unwrap();

    info!("Glasses control plane initialized, waiting for data...");
}

/// Milliseconds since boot, wrapping.
fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

/// UART task - reads bytes from UART and queues them for the control task.
#[embassy_executor::task]
async fn uart_task(
    mut input: UartByteSource<'static>,
    queue: Sender<'static, CriticalSectionRawMutex, u8, BYTE_QUEUE_DEPTH>,
) {
    loop {
        match input.read_byte().await {
            Ok(byte) => queue.send(byte).await,
            Err(e) => {
                // The parser times out any frame the error cut short.
                error!("UART error: {:?}", e);
            }
        }
    }
}

/// Control task - feeds queued bytes to the parser and ticks the control plane.
#[embassy_executor::task]
async fn control_task(
    mut plane: ControlPlane<StatusLedHost<Output<'static>>>,
    mut source: ChannelByteSource<'static>,
    mode_button: Input<'static>,
) {
    let mut ticker = Ticker::every(TICK_PERIOD);
    let mut buf = [0u8; CHUNK_SIZE];

    plane.set_mode_button(mode_button.is_low());
    plane.start(0, now_ms());

    loop {
        let event = select(
            ticker.next(),
            pump(&mut source, &mut plane, &mut buf, now_ms),
        )
        .await;

        match event {
            Either::First(()) => {
                plane.set_mode_button(mode_button.is_low());
                // No radio on this board, so there is never a gamepad report.
                if let Some(change) = plane.tick(now_ms(), None) {
                    match change {
                        SceneChange::Next | SceneChange::Previous => {
                            info!("Scene -> {}", plane.scene_index());
                        }
                        SceneChange::BrightnessUp | SceneChange::BrightnessDown => {
                            info!("Scene {} brightness {}", plane.scene_index(), plane.brightness());
                        }
                        SceneChange::PairingStarted => {
                            // Nothing to pair with; leave right away.
                            warn!("Pairing requested, but this board has no radio");
                            plane.end_pairing();
                        }
                        SceneChange::PairingStopped => {}
                    }
                }
            }
            Either::Second(Ok(_)) => {}
            Either::Second(Err(e)) => warn!("Command link error: {:?}", e),
        }
    }
}
