use super::pins::PinId;
use crate::memory::RegisterWindow;

/// Offset of the GPIO block from the start of the peripheral block
pub const GPIO_OFFSET: u64 = 0x0020_0000;

/// Bytes of the GPIO block used by the pin operations, up to the last pull clock register
pub const GPIO_BLOCK_LEN: usize = 0xA0;

//==================================================================================================
//  RegisterFamily
//==================================================================================================

/// Layout of a group of consecutive registers sharing one purpose
///
/// Every pin owns a field of `width` bits in exactly one register of the family. Registers are
/// 4 bytes apart and each holds the fields of `pins_per_register` pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFamily {
    width: u8,
    pins_per_register: u8,
    base: usize,
}

impl RegisterFamily {
    const fn one_bit(base: usize) -> Self {
        RegisterFamily {
            width: 1,
            pins_per_register: 32,
            base,
        }
    }

    const fn three_bit(base: usize) -> Self {
        RegisterFamily {
            width: 3,
            pins_per_register: 10,
            base,
        }
    }

    /// GPFSELn, function select
    pub const MODE: Self = Self::three_bit(0x00);
    /// GPSETn, writing 1 drives the pin high
    pub const SET: Self = Self::one_bit(0x1C);
    /// GPCLRn, writing 1 drives the pin low
    pub const CLEAR: Self = Self::one_bit(0x28);
    /// GPLEVn, current pin level
    pub const LEVEL: Self = Self::one_bit(0x34);
    /// GPEDSn, sticky event status, write 1 to clear
    pub const EVENT_DETECT: Self = Self::one_bit(0x40);
    pub const RISING_EDGE: Self = Self::one_bit(0x4C);
    pub const FALLING_EDGE: Self = Self::one_bit(0x58);
    pub const HIGH_DETECT: Self = Self::one_bit(0x64);
    pub const LOW_DETECT: Self = Self::one_bit(0x70);
    pub const ASYNC_RISING_EDGE: Self = Self::one_bit(0x7C);
    pub const ASYNC_FALLING_EDGE: Self = Self::one_bit(0x88);
    /// GPPUD. A single control word shared by all pins, only `base` is meaningful.
    pub const PULL_TYPE: Self = Self::one_bit(0x94);
    /// GPPUDCLKn, latches the GPPUD value into the pins written with 1
    pub const PULL_CLOCK: Self = Self::one_bit(0x98);

    /// Field width in bits, 1 or 3
    #[inline]
    pub const fn width(&self) -> u32 {
        self.width as u32
    }

    #[inline]
    pub const fn pins_per_register(&self) -> u32 {
        self.pins_per_register as u32
    }

    /// Byte offset of the first register from the GPIO base
    #[inline]
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Locate the field of `pin` inside this family
    #[inline]
    pub const fn locate(&self, pin: PinId) -> FieldLocation {
        locate(pin, *self)
    }
}

//==================================================================================================
//  FieldLocation
//==================================================================================================

/// Position of a single pin field inside the GPIO register block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLocation {
    /// Byte offset of the register from the GPIO base
    pub offset: usize,
    /// Bit position of the lowest bit of the field
    pub shift: u32,
    pub width: u32,
}

impl FieldLocation {
    /// Mask of the field with the field bits in place
    #[inline]
    pub const fn mask(&self) -> u32 {
        ((1 << self.width) - 1) << self.shift
    }

    /// `1 << shift`, the value written to set, clear and write-1-to-clear registers
    #[inline]
    pub const fn bit(&self) -> u32 {
        1 << self.shift
    }

    /// Extract the field from a register value
    #[inline]
    pub const fn decode(&self, word: u32) -> u32 {
        (word >> self.shift) & ((1 << self.width) - 1)
    }

    /// Replace the field in a register value. Bits of `value` beyond the field width are
    /// dropped.
    #[inline]
    pub const fn encode(&self, word: u32, value: u32) -> u32 {
        (word & !self.mask()) | ((value << self.shift) & self.mask())
    }
}

/// Compute where the field of `pin` lives in `family`
#[inline]
pub const fn locate(pin: PinId, family: RegisterFamily) -> FieldLocation {
    let index = pin.index();
    let per_reg = family.pins_per_register();
    FieldLocation {
        offset: family.base() + (index / per_reg) as usize * 4,
        shift: (index % per_reg) * family.width(),
        width: family.width(),
    }
}

//==================================================================================================
// Register Interface
//==================================================================================================

/// Generic field accessor for pin objects
///
/// Implementers supply the pin ID and the register window. The provided functions perform the
/// three kinds of accesses the GPIO block needs, parameterized by [`RegisterFamily`]:
///
/// - read-modify-write of the field, for configuration registers
/// - plain write of the pin bit, for set, clear and write-1-to-clear registers
/// - read of the field
///
/// None of these are atomic. Pins sharing a register word must not be modified concurrently
/// from different threads.
pub(super) trait RegisterInterface {
    type Window: RegisterWindow;

    fn id(&self) -> PinId;

    fn window(&self) -> &Self::Window;

    #[inline]
    fn locate(&self, family: RegisterFamily) -> FieldLocation {
        locate(self.id(), family)
    }

    #[inline]
    fn read_field(&self, family: RegisterFamily) -> u32 {
        let loc = self.locate(family);
        loc.decode(self.window().read(loc.offset))
    }

    #[inline]
    fn write_field(&self, family: RegisterFamily, value: u32) {
        let loc = self.locate(family);
        self.window().modify(loc.offset, |word| loc.encode(word, value));
    }

    /// Write only the pin bit. All other bits of the register are written as 0.
    #[inline]
    fn write_bit(&self, family: RegisterFamily) {
        let loc = self.locate(family);
        self.window().write(loc.offset, loc.bit());
    }

    #[inline]
    fn modify_bit(&self, family: RegisterFamily, set: bool) {
        let loc = self.locate(family);
        let bit = loc.bit();
        // Only the bit for this Pin ID is modified
        self.window().modify(loc.offset, |word| {
            if set {
                word | bit
            } else {
                word & !bit
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_BIT_FAMILIES: [RegisterFamily; 12] = [
        RegisterFamily::SET,
        RegisterFamily::CLEAR,
        RegisterFamily::LEVEL,
        RegisterFamily::EVENT_DETECT,
        RegisterFamily::RISING_EDGE,
        RegisterFamily::FALLING_EDGE,
        RegisterFamily::HIGH_DETECT,
        RegisterFamily::LOW_DETECT,
        RegisterFamily::ASYNC_RISING_EDGE,
        RegisterFamily::ASYNC_FALLING_EDGE,
        RegisterFamily::PULL_TYPE,
        RegisterFamily::PULL_CLOCK,
    ];

    fn pin(index: u32) -> PinId {
        PinId::new(index).unwrap()
    }

    #[test]
    fn mode_field_positions() {
        let loc = locate(pin(0), RegisterFamily::MODE);
        assert_eq!((loc.offset, loc.shift, loc.width), (0x00, 0, 3));
        let loc = locate(pin(9), RegisterFamily::MODE);
        assert_eq!((loc.offset, loc.shift), (0x00, 27));
        let loc = locate(pin(10), RegisterFamily::MODE);
        assert_eq!((loc.offset, loc.shift), (0x04, 0));
        let loc = locate(pin(53), RegisterFamily::MODE);
        assert_eq!((loc.offset, loc.shift), (0x14, 9));
    }

    #[test]
    fn one_bit_field_positions() {
        for family in ONE_BIT_FAMILIES {
            let loc = locate(pin(31), family);
            assert_eq!((loc.offset, loc.shift, loc.width), (family.base(), 31, 1));
            let loc = locate(pin(32), family);
            assert_eq!((loc.offset, loc.shift), (family.base() + 4, 0));
            let loc = locate(pin(53), family);
            assert_eq!((loc.offset, loc.shift), (family.base() + 4, 21));
        }
    }

    #[test]
    fn register_offsets_match_datasheet() {
        assert_eq!(RegisterFamily::SET.base(), 0x1C);
        assert_eq!(RegisterFamily::CLEAR.base(), 0x28);
        assert_eq!(RegisterFamily::LEVEL.base(), 0x34);
        assert_eq!(RegisterFamily::EVENT_DETECT.base(), 0x40);
        assert_eq!(RegisterFamily::RISING_EDGE.base(), 0x4C);
        assert_eq!(RegisterFamily::FALLING_EDGE.base(), 0x58);
        assert_eq!(RegisterFamily::HIGH_DETECT.base(), 0x64);
        assert_eq!(RegisterFamily::LOW_DETECT.base(), 0x70);
        assert_eq!(RegisterFamily::ASYNC_RISING_EDGE.base(), 0x7C);
        assert_eq!(RegisterFamily::ASYNC_FALLING_EDGE.base(), 0x88);
        assert_eq!(RegisterFamily::PULL_TYPE.base(), 0x94);
        assert_eq!(RegisterFamily::PULL_CLOCK.base(), 0x98);
    }

    #[test]
    fn fields_of_distinct_pins_never_overlap() {
        let mut families = ONE_BIT_FAMILIES.to_vec();
        families.push(RegisterFamily::MODE);
        for family in families {
            for a in 0..=53 {
                for b in (a + 1)..=53 {
                    let (la, lb) = (locate(pin(a), family), locate(pin(b), family));
                    assert!(
                        la.offset != lb.offset || la.mask() & lb.mask() == 0,
                        "pins {a} and {b} overlap in {family:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn fields_stay_inside_register_word() {
        for index in 0..=53 {
            let loc = locate(pin(index), RegisterFamily::MODE);
            assert!(loc.shift + loc.width <= 30);
            let loc = locate(pin(index), RegisterFamily::LEVEL);
            assert!(loc.shift < 32);
        }
    }

    #[test]
    fn encode_only_touches_field() {
        let loc = locate(pin(12), RegisterFamily::MODE);
        assert_eq!(loc.mask(), 0b111 << 6);
        let word = loc.encode(0xFFFF_FFFF, 0b001);
        assert_eq!(word, !(0b110 << 6));
        assert_eq!(loc.decode(word), 0b001);
        // Oversized values are truncated to the field
        assert_eq!(loc.encode(0, 0b1_010), 0b010 << 6);
    }

    #[test]
    fn bit_of_one_bit_field() {
        let loc = locate(pin(35), RegisterFamily::SET);
        assert_eq!(loc.bit(), 1 << 3);
        assert_eq!(loc.mask(), loc.bit());
        assert_eq!(loc.decode(1 << 3), 1);
        assert_eq!(loc.decode(!(1 << 3)), 0);
    }

    #[test]
    fn every_field_lies_inside_gpio_block() {
        let mut families = ONE_BIT_FAMILIES.to_vec();
        families.push(RegisterFamily::MODE);
        for family in families {
            assert!(family.pins_per_register() * family.width() <= 32);
            let loc = locate(pin(53), family);
            assert!(loc.offset + 4 <= GPIO_BLOCK_LEN, "{family:?}");
        }
        assert_eq!(RegisterFamily::PULL_CLOCK.base() + 8, GPIO_BLOCK_LEN);
        assert_eq!(RegisterFamily::MODE.width(), 3);
        assert_eq!(RegisterFamily::MODE.pins_per_register(), 10);
    }
}
