//! SSD1306 OLED rendering of a [`View`].
//!
//! ```text
//! ┌────────────────────────────┐
//! │  12:34:56              ▲   │
//! │  Pain App                  │
//! │                        7   │
//! │                        ▼   │
//! └────────────────────────────┘
//! ```
//! The arrows and the level only appear while the entry widget is open.

use core::fmt::Write;

use embedded_graphics::image::{Image, ImageRaw};
use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;
use heapless::String;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

use crate::error::Error;
use crate::ui::{ArrowRole, View};

/// Concrete display driver, generic over the HAL's blocking I²C.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

const ICON_SIZE: u32 = 8;

/// 8×8 1bpp action-bar icons, indexed by [`ArrowRole::index`].
static ARROW_ICONS: [[u8; 8]; ArrowRole::COUNT] = [
    // Up
    [0x18, 0x3C, 0x7E, 0xFF, 0x18, 0x18, 0x18, 0x18],
    // Select
    [0x00, 0x3C, 0x7E, 0x7E, 0x7E, 0x7E, 0x3C, 0x00],
    // Down
    [0x18, 0x18, 0x18, 0x18, 0xFF, 0x7E, 0x3C, 0x18],
];

/// Top-left corner of each role's icon on the right edge of the screen.
const fn icon_origin(role: ArrowRole) -> Point {
    match role {
        ArrowRole::Up => Point::new(116, 4),
        ArrowRole::Select => Point::new(116, 28),
        ArrowRole::Down => Point::new(116, 52),
    }
}

/// Initialise the SSD1306 display and clear the screen.
pub fn init<I2C>(i2c: I2C) -> Result<Display<I2C>, Error>
where
    I2C: embedded_hal::i2c::I2c,
{
    let interface = I2CDisplayInterface::new(i2c);
    let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    display.init().map_err(|_| Error::Display)?;
    display.clear_buffer();
    display.flush().map_err(|_| Error::Display)?;
    Ok(display)
}

fn style(font: &'static MonoFont<'static>) -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(font)
        .text_color(BinaryColor::On)
        .build()
}

/// Render one frame.
pub fn draw<I2C>(display: &mut Display<I2C>, view: &View) -> Result<(), Error>
where
    I2C: embedded_hal::i2c::I2c,
{
    display.clear_buffer();

    // Drawing into the frame buffer cannot fail; only the flush talks to
    // the panel.
    let _ = Text::new(view.clock.as_str(), Point::new(4, 22), style(&FONT_10X20)).draw(display);
    let _ = Text::new(view.banner, Point::new(4, 40), style(&FONT_6X10)).draw(display);

    if let Some(level) = view.pain_level {
        let mut text: String<2> = String::new();
        let _ = write!(text, "{}", level.get());
        let _ = Text::new(text.as_str(), Point::new(96, 44), style(&FONT_10X20)).draw(display);
    }

    for &role in view.visible_arrows() {
        let raw = ImageRaw::<BinaryColor>::new(&ARROW_ICONS[role.index()], ICON_SIZE);
        let _ = Image::new(&raw, icon_origin(role)).draw(display);
    }

    display.flush().map_err(|_| Error::Display)
}
