use super::*;

#[cfg(test)]
mod additional_cpu_tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decimal_mode_ignored() {
        // SED; ADC #$01 stays binary on the 2A03
        let (cpu, _) = run(&[0xF8, 0x69, 0x01], 2, |cpu, _| cpu.a = 0x09);
        assert!(cpu.status.contains(Status::DECIMAL));
        assert_eq!(cpu.a, 0x0A);
    }

    #[test]
    fn test_stack_operations_detailed() {
        // PHA; PHP; PLP; PLA with the stack starting at $01FF
        let (cpu, bus) = run(&[0x48, 0x08, 0x28, 0x68], 4, |cpu, _| {
            cpu.sp = 0xFF;
            cpu.a = 0x42;
            cpu.status = Status::from_int(0x24);
        });
        assert_eq!(bus.memory[0x01FF], 0x42);
        assert_eq!(bus.memory[0x01FE], 0x34);
        assert_eq!(cpu.sp, 0xFF);
        assert_eq!(cpu.a, 0x42);
        assert_eq!(cpu.status.to_int(), 0x24);
    }

    #[test]
    fn test_nested_subroutines() {
        let (mut cpu, mut bus) = setup_cpu();
        // $8000: JSR $9000; $9000: JSR $A000; RTS; $A000: RTS
        bus.load_program(&[0x20, 0x00, 0x90], 0x8000);
        bus.load_program(&[0x20, 0x00, 0xA0, 0x60], 0x9000);
        bus.load_program(&[0x60], 0xA000);

        for _ in 0..4 {
            cpu.step(&mut bus).unwrap();
        }
        assert_eq!(cpu.pc, 0x8003);
        assert_eq!(cpu.sp, 0xFD);
    }

    #[test]
    fn test_loop_counts_down() {
        // LDX #$05; loop: DEX; BNE loop
        let (mut cpu, mut bus) = setup_cpu();
        bus.load_program(&[0xA2, 0x05, 0xCA, 0xD0, 0xFD], 0x8000);
        let mut steps = 0;
        while cpu.pc != 0x8005 {
            cpu.step(&mut bus).unwrap();
            steps += 1;
        }
        assert_eq!(cpu.x, 0);
        assert!(cpu.status.contains(Status::ZERO));
        assert_eq!(steps, 1 + 5 * 2);
    }

    proptest! {
        #[test]
        fn prop_adc_matches_wide_arithmetic(a in any::<u8>(), m in any::<u8>(), carry in any::<bool>()) {
            let (cpu, _) = run(&[0x69, m], 1, |cpu, _| {
                cpu.a = a;
                cpu.status.set(Status::CARRY, carry);
            });
            let sum = a as u16 + m as u16 + carry as u16;
            let signed = a as i8 as i16 + m as i8 as i16 + carry as i16;
            prop_assert_eq!(cpu.a, sum as u8);
            prop_assert_eq!(cpu.status.contains(Status::CARRY), sum > 0xFF);
            prop_assert_eq!(cpu.status.contains(Status::OVERFLOW), !(-128..=127).contains(&signed));
            prop_assert_eq!(cpu.status.contains(Status::ZERO), sum as u8 == 0);
            prop_assert_eq!(cpu.status.contains(Status::NEGATIVE), sum & 0x80 != 0);
        }

        #[test]
        fn prop_sbc_matches_wide_arithmetic(a in any::<u8>(), m in any::<u8>(), carry in any::<bool>()) {
            let (cpu, _) = run(&[0xE9, m], 1, |cpu, _| {
                cpu.a = a;
                cpu.status.set(Status::CARRY, carry);
            });
            let borrow = !carry as i16;
            let diff = a as i16 - m as i16 - borrow;
            let signed = a as i8 as i16 - m as i8 as i16 - borrow;
            prop_assert_eq!(cpu.a, diff as u8);
            prop_assert_eq!(cpu.status.contains(Status::CARRY), diff >= 0);
            prop_assert_eq!(cpu.status.contains(Status::OVERFLOW), !(-128..=127).contains(&signed));
        }

        #[test]
        fn prop_compare_sets_carry_when_not_less(reg in any::<u8>(), m in any::<u8>()) {
            let (cpu, _) = run(&[0xC9, m], 1, |cpu, _| cpu.a = reg);
            prop_assert_eq!(cpu.status.contains(Status::CARRY), reg >= m);
            prop_assert_eq!(cpu.status.contains(Status::ZERO), reg == m);
            prop_assert_eq!(cpu.status.contains(Status::NEGATIVE), reg.wrapping_sub(m) & 0x80 != 0);
            prop_assert_eq!(cpu.a, reg);
        }

        #[test]
        fn prop_zero_page_x_stays_in_page_zero(base in any::<u8>(), x in any::<u8>(), value in any::<u8>()) {
            let (cpu, _) = run(&[0xB5, base], 1, |cpu, bus| {
                cpu.x = x;
                bus.memory[base.wrapping_add(x) as usize] = value;
            });
            prop_assert_eq!(cpu.a, value);
        }

        #[test]
        fn prop_absolute_y_wraps_address_space(base in any::<u16>(), y in any::<u8>(), value in any::<u8>()) {
            let target = base.wrapping_add(y as u16);
            // Keep the target clear of the program bytes.
            prop_assume!(!(0x8000..0x8003).contains(&target));
            let [lo, hi] = base.to_le_bytes();
            let (cpu, _) = run(&[0xB9, lo, hi], 1, |cpu, bus| {
                cpu.y = y;
                bus.memory[target as usize] = value;
            });
            prop_assert_eq!(cpu.a, value);
        }

        #[test]
        fn prop_php_plp_round_trips_flags(p in any::<u8>()) {
            let (cpu, bus) = run(&[0x08, 0x28], 2, |cpu, _| {
                cpu.status = Status::from_int(p);
            });
            prop_assert_eq!(bus.memory[0x01FD], p | 0x30);
            prop_assert_eq!(cpu.status.to_int(), p);
        }
    }
}
