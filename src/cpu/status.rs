use bitflags::bitflags;

bitflags! {
    /// Processor status register, `NV11 DIZC` with bit 0 = carry.
    ///
    /// Bits 4 and 5 have no storage on real hardware; they only appear in
    /// the copy pushed to the stack.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        const CARRY = 0b0000_0001;
        const ZERO = 0b0000_0010;
        const INTERRUPT = 0b0000_0100;
        const DECIMAL = 0b0000_1000;
        const UNUSED1 = 0b0001_0000;
        const UNUSED2 = 0b0010_0000;
        const OVERFLOW = 0b0100_0000;
        const NEGATIVE = 0b1000_0000;
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::INTERRUPT
    }
}

impl Status {
    /// Bits forced on when the register is pushed and skipped when pulled.
    pub const STACK_ONLY: Status = Status::UNUSED1.union(Status::UNUSED2);

    /// Flags an instruction may declare for the generic update.
    pub const NZ: Status = Status::NEGATIVE.union(Status::ZERO);
    pub const NZC: Status = Status::NZ.union(Status::CARRY);
    pub const NZCV: Status = Status::NZC.union(Status::OVERFLOW);
    pub const NZV: Status = Status::NZ.union(Status::OVERFLOW);

    pub fn to_int(self) -> u8 {
        self.bits()
    }

    pub fn from_int(byte: u8) -> Status {
        Status::from_bits_retain(byte)
    }

    /// Overwrites every flag from `byte` except those in `ignored`, which keep
    /// their current state.
    pub fn load_int(&mut self, byte: u8, ignored: Status) {
        let incoming = Status::from_int(byte);
        *self = (*self & ignored) | (incoming - ignored);
    }

    /// The byte PHP and BRK push.
    pub fn pushed(self) -> u8 {
        (self | Status::STACK_ONLY).to_int()
    }

    /// Generic tier of the flag policy: zero and negative follow `value` when
    /// the instruction declares them.
    pub fn update_zero_negative(&mut self, declared: Status, value: u8) {
        if declared.contains(Status::ZERO) {
            self.set(Status::ZERO, value == 0);
        }
        if declared.contains(Status::NEGATIVE) {
            self.set(Status::NEGATIVE, value & 0x80 != 0);
        }
    }
}
