#![no_std]
#![no_main]

use panic_halt as _;

use core::convert::Infallible;

use ch32_can::{
    demo::{self, DEMO_BITRATE, DEMO_CAN_CLOCK_HZ},
    filter::FrameFormat,
    mmio::{Can1, Can1Pins},
    regs::Mode,
    timer::{SpinTimer, TIMEOUT_LIMIT},
    timing::BitTiming,
    Can, Settings,
};
use ch32_hal as hal;
use embedded_hal::blocking::delay::DelayMs;
use qingke::riscv;

const SYSCLK_HZ: u32 = 96_000_000;
/// CAN1 sits on APB1, which runs at half the system clock.
const PCLK1_HZ: u32 = SYSCLK_HZ / 2;

const TIMING: BitTiming = BitTiming::KBPS_333_AT_48MHZ;

const _: () = assert!(PCLK1_HZ == DEMO_CAN_CLOCK_HZ);
const _: () = assert!(TIMING.bitrate(PCLK1_HZ) == DEMO_BITRATE);

/// Console over the debug interface.
struct SdiConsole;

impl ufmt::uWrite for SdiConsole {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        hal::print!("{}", s);
        Ok(())
    }
}

/// Busy-wait delay counted in core cycles.
struct CycleDelay;

impl DelayMs<u16> for CycleDelay {
    fn delay_ms(&mut self, ms: u16) {
        riscv::asm::delay(u32::from(ms) * (SYSCLK_HZ / 1_000));
    }
}

fn kernel_clock<T: hal::RccPeripheral>() -> u32 {
    T::frequency().0
}

#[qingke_rt::entry]
fn main() -> ! {
    hal::debug::SDIPrint::enable();
    let mut config = hal::Config::default();
    config.rcc = hal::rcc::Config::SYSCLK_FREQ_96MHZ_HSI;
    let _p = hal::init(config);

    let mut console = SdiConsole;
    let mut delay = CycleDelay;

    if kernel_clock::<hal::peripherals::CAN1>() != PCLK1_HZ {
        hal::println!("Warning: CAN1 clock differs from {} Hz", PCLK1_HZ);
    }

    // SAFETY: CAN1 and PB8/PB9 are not used anywhere else.
    let can1 = unsafe { Can1::steal(Can1Pins::PB8PB9) };
    let mut can = Can::new(can1, SpinTimer::new(), TIMEOUT_LIMIT);

    // Only frames with identifier 0x317 are accepted.
    let settings = Settings::new(TIMING, Mode::Normal, FrameFormat::Standard);
    if can.init(settings).is_err() {
        let _ = ufmt::uwrite!(&mut console, "Error: CAN_BUS init failed!\r\n");
    }

    demo::run(&mut can, &mut delay, &mut console)
}
