#![cfg_attr(not(test), no_std)]


pub use rtcc::{
  DateTimeAccess, NaiveDate, NaiveDateTime, Datelike, Timelike,
};



use embedded_hal::blocking::i2c::{Write, Read, WriteRead};

// Fixed i2c bus address of the device (7-bit)
const DS3231_ADDRESS: u8 = 0xD0 >> 1;

// Register addresses.
// The seven clock registers are consecutive, so both the read and the
// set paths address the block through REG_SECONDS alone.
const REG_SECONDS: u8 = 0x00;
// const REG_MINUTES: u8 = 0x01;

// Holds the current hour, in two binary coded decimal (BCD) digits.
// Bit 6 selects between 12-hour and 24-hour mode, and bit 5 carries
// the AM/PM flag when 12-hour mode is selected.
// This driver only ever operates the device in 24-hour mode.
// const REG_HOURS: u8 = 0x02;

// Holds the current day of the week.
// Each value represents one weekday that is assigned by the user.
// Values will range from 1 to 7.
// const REG_WEEKDAY: u8 = 0x03;

// Holds the current day of the month, in two binary coded decimal (BCD) digits.
// Values will range from 01 to 31.
// const REG_DATE: u8 = 0x04;

// Holds the current month, in two binary coded decimal (BCD) digits.
// Values will range from 01 to 12.
// Bit 7 is the century overflow flag, toggled when the year register
// wraps from 99 to 00.
// const REG_MONTH: u8 = 0x05;

// Holds the two low decimal digits of the current year, in BCD.
// const REG_YEAR: u8 = 0x06;

// Number of consecutive clock registers, seconds through year.
const CLOCK_REGS_LEN: usize = 7;

// REG_HOURS flag bits:
const HOUR_24H_BIT: u8 = 1 << 6; // 12_24 mode select, forced high on every write
const HOUR_AM_PM_BIT: u8 = 1 << 5; // AM/PM flag, only meaningful in 12-hour mode

// REG_MONTH flag bits:
const MONTH_CENTURY_BIT: u8 = 1 << 7; // century overflow flag, ignored
// Month register bits above the two BCD month digits, masked off on read.
const MONTH_FLAG_BITS: u8 = MONTH_CENTURY_BIT | (1 << 6) | (1 << 5);

/// The device only stores the two low decimal digits of the year;
/// this fixed offset is added back when reconstructing the full year.
pub const CENTURY: u16 = 2000;


/// DS3231
/// Extremely Accurate I2C-Integrated Real-Time Clock (RTC)
/// rust no_std driver (utilizes the embedded_hal i2c interface)
///
/// The driver caches the clock fields from the most recent successful
/// read or set; a failed bus exchange never leaves a partial update
/// behind. Alarm, square wave and temperature registers are out of scope.
pub struct Ds3231<I2C> {
  i2c: I2C,
  mux_addr: u8,
  mux_chan: u8,
  second: u8,
  minute: u8,
  hour: u8,
  weekday: u8,
  day: u8,
  month: u8,
  year: u16,
}

impl<I2C, E> Ds3231<I2C>
  where
    I2C: Write<Error = E> + Read<Error = E> + WriteRead<Error = E>,
{

  /// New driver instance, assumes that there is no i2c mux
  /// sitting between the RTC and the host.
  pub fn new(i2c: I2C) -> Self {
    Ds3231 {
      i2c,
      mux_addr: 0u8,
      mux_chan: 0u8,
      second: 0,
      minute: 0,
      hour: 0,
      weekday: 0,
      day: 0,
      month: 0,
      year: 0,
    }
  }

  /// Allows the caller to create a new driver instance with
  /// an i2c mux between the RTC and the host.
  /// - `mux_addr` : the i2c address of the mux itself
  /// - `mux_chan` : the mux channel assigned to the RTC
  pub fn new_with_mux(i2c: I2C, mux_addr: u8, mux_chan: u8) -> Self {
    let mut rtc = Self::new(i2c);
    rtc.mux_addr = mux_addr;
    rtc.mux_chan = mux_chan;
    rtc
  }

  /// Consume the driver and hand the i2c bus back to the caller.
  pub fn release(self) -> I2C {
    self.i2c
  }

  // Converts a binary value to BCD format.
  // Only defined for inputs in 0..=99; larger values wrap silently.
  fn bin_to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
  }

  // Converts a BCD value to binary format.
  // Nibbles outside 0..=9 produce a nonsensical but harmless result.
  fn bcd_to_bin(value: u8) -> u8 {
    ((value & 0xF0) >> 4) * 10 + (value & 0x0F)
  }

  // If using an i2c mux, tell the mux to select our channel
  fn select_mux_channel(&mut self) -> Result<(), E> {
    if self.mux_addr != 0u8 {
      self.i2c.write(self.mux_addr, &[self.mux_chan])
    }
    else {
      Ok(())
    }
  }

  /// Verify the device responds and prime the cached clock fields
  /// with one initial read.
  /// Bus and pin setup belong to the HAL that provides `i2c`.
  pub fn init(&mut self) -> Result<(), E> {
    self.read_clock()
  }

  /// Refresh all cached clock fields from the device.
  ///
  /// Sets the register pointer to the seconds register in one
  /// transaction, then reads the seven clock registers in a second
  /// transaction. The cache is only overwritten once both exchanges
  /// have succeeded; any bus error leaves the previous snapshot intact.
  pub fn read_clock(&mut self) -> Result<(), E> {
    self.select_mux_channel()?;
    self.i2c.write(DS3231_ADDRESS, &[REG_SECONDS])?;
    let mut buf = [0u8; CLOCK_REGS_LEN];
    self.i2c.read(DS3231_ADDRESS, &mut buf)?;

    self.second = Self::bcd_to_bin(buf[0]);
    self.minute = Self::bcd_to_bin(buf[1]);
    // Disregard the 12_24 and AM/PM flags. Assume 24h time.
    self.hour = Self::bcd_to_bin(buf[2] & !(HOUR_24H_BIT | HOUR_AM_PM_BIT));
    self.weekday = Self::bcd_to_bin(buf[3]);
    self.day = Self::bcd_to_bin(buf[4]);
    self.month = Self::bcd_to_bin(buf[5] & !MONTH_FLAG_BITS);
    self.year = Self::bcd_to_bin(buf[6]) as u16 + CENTURY;
    Ok(())
  }

  /// Set the clock on the device.
  ///
  /// Arguments proceed from most significant to least significant value,
  /// but the device registers are laid out the other way around, so the
  /// payload is encoded seconds-first: one write run starting at the
  /// seconds register covers the whole clock in a single transaction.
  /// The 24-hour mode bit is always forced into the hour byte.
  ///
  /// Fields are not range-checked; out-of-range values (for example a
  /// year outside `CENTURY..=CENTURY+99`) encode to garbage on the
  /// device. On success the cache takes these exact decimal values.
  pub fn set_clock(&mut self, year: u16, month: u8, day: u8, weekday: u8,
                   hour: u8, minute: u8, second: u8) -> Result<(), E> {
    self.select_mux_channel()?;
    self.i2c.write(DS3231_ADDRESS, &[
      REG_SECONDS,
      Self::bin_to_bcd(second),
      Self::bin_to_bcd(minute),
      Self::bin_to_bcd(hour) | HOUR_24H_BIT,
      Self::bin_to_bcd(weekday),
      Self::bin_to_bcd(day),
      Self::bin_to_bcd(month),
      Self::bin_to_bcd(year.wrapping_sub(CENTURY) as u8),
    ])?;

    #[cfg(feature = "defmt")]
    defmt::debug!("clock set to {}-{}-{} {}:{}:{} (weekday {})",
                  year, month, day, hour, minute, second, weekday);

    // Now that the registers are written, overwrite the cache with the
    // values as passed rather than re-decoding them from BCD.
    self.second = second;
    self.minute = minute;
    self.hour = hour;
    self.weekday = weekday;
    self.day = day;
    self.month = month;
    self.year = year;
    Ok(())
  }

  /// Get the most recently read second (0..59)
  pub fn second(&self) -> u8 {
    self.second
  }

  /// Get the most recently read minute (0..59)
  pub fn minute(&self) -> u8 {
    self.minute
  }

  /// Get the most recently read hour (0..23, 24h format)
  pub fn hour(&self) -> u8 {
    self.hour
  }

  /// Get the most recently read day of the week (1..7, meaning assigned by the user)
  pub fn weekday(&self) -> u8 {
    self.weekday
  }

  /// Get the most recently read day of the month (1..31)
  pub fn day(&self) -> u8 {
    self.day
  }

  /// Get the most recently read month (1..12)
  pub fn month(&self) -> u8 {
    self.month
  }

  /// Get the most recently read year, with century (2000..2099)
  pub fn year(&self) -> u16 {
    self.year
  }

}

impl<I2C, E> DateTimeAccess for Ds3231<I2C>
  where
    I2C: Write<Error = E> + Read<Error = E> + WriteRead<Error = E>,
{
  type Error = E;

  /// Reads the clock registers and assembles them into a datetime.
  /// The device covers years 2000 to 2099; its automatic leap year
  /// correction is only valid within that range.
  fn datetime(&mut self) -> Result<NaiveDateTime, Self::Error> {
    self.read_clock()?;
    let dt = NaiveDate::from_ymd_opt(
      self.year as i32, self.month as u32, self.day as u32)
      .expect("YMD")
      .and_hms_opt(self.hour as u32, self.minute as u32, self.second as u32)
      .expect("HMS");
    Ok(dt)
  }

  /// This implementation assumes (but doesn't verify)
  /// that the caller is setting the RTC datetime to values within its
  /// range (from 2000 to 2099).
  /// The weekday register is written as 1 = Monday .. 7 = Sunday.
  fn set_datetime(&mut self, datetime: &NaiveDateTime) -> Result<(), Self::Error> {
    self.set_clock(
      datetime.year() as u16,
      datetime.month() as u8,
      datetime.day() as u8,
      datetime.weekday().number_from_monday() as u8,
      datetime.hour() as u8,
      datetime.minute() as u8,
      datetime.second() as u8,
    )
  }

}
