extern crate ds3231_rtc;

use linux_embedded_hal::I2cdev;
use chrono::{Datelike, Timelike, Utc};
use ds3231_rtc::Ds3231;
use std::time::Duration;
use std::thread::sleep;



/**
Example testing real RTC communications,
assuming linux environment (such as Raspberry Pi 3+)
with DS3231 attached to i2c1.
The following was tested by enabling i2c-1 on a Raspberry Pi 3+
using `sudo raspi-config`
and connecting the SDA, SCL, GND, and 3.3V pins from RPi to the RTC
*/

fn get_sys_date_time() -> (u16, u8, u8, u8, u8, u8, u8)
{
    let now = Utc::now();
    let now_hour: u8 = now.hour().try_into().unwrap();
    let now_minute: u8 = now.minute().try_into().unwrap();
    let now_second: u8 = now.second().try_into().unwrap();
    let now_day: u8 = now.day().try_into().unwrap();
    let now_month: u8 = now.month().try_into().unwrap();
    let now_year: u16 = now.year().try_into().unwrap();
    let now_weekday: u8 = now.weekday().number_from_monday().try_into().unwrap();
    (now_year, now_month, now_day, now_weekday, now_hour, now_minute, now_second)
}

fn main() {

    // Initialize the I2C device
    let i2c = I2cdev::new("/dev/i2c-1")
        .expect("Failed to open I2C device");

    // Create a new instance of the DS3231 driver
    let mut rtc = Ds3231::new(i2c);
    rtc.init().expect("RTC did not respond");

    // Pull the current system time and synchronize RTC time to that
    let (year, month, day, weekday, hour, minute, second) = get_sys_date_time();
    rtc.set_clock(year, month, day, weekday, hour, minute, second)
        .expect("couldn't set clock");
    println!("sys date: {}-{:02}-{:02} {:02}:{:02}:{:02}",
             year, month, day, hour, minute, second);

    // Watch the clock tick for a few seconds
    for _ in 0..5 {
        sleep(Duration::from_secs(1));
        rtc.read_clock().expect("couldn't read clock");
        println!("rtc date: {}-{:02}-{:02} {:02}:{:02}:{:02} (weekday {})",
                 rtc.year(), rtc.month(), rtc.day(),
                 rtc.hour(), rtc.minute(), rtc.second(), rtc.weekday());
    }
}
