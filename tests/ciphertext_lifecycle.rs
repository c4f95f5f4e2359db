use toy_heaan_ciphertext::{
    CIPHERTEXT_SIZE_MAX, CIPHERTEXT_SIZE_MIN, Ciphertext, CiphertextError, EncryptionParameters,
    EncryptionParametersBuilder, ErrorKind, HeContext, ParameterRegistry, ParmsEntry, ParmsId,
    SchemeType, is_metadata_valid_for,
};

fn small_context() -> HeContext {
    HeContext::new(EncryptionParameters::new(SchemeType::Ckks, 8, vec![17, 97, 113]))
}

/// Registry with a single level of arbitrary shape; no prime checks.
struct FixedRegistry {
    id: ParmsId,
    degree: usize,
    moduli: Vec<u64>,
}

impl ParameterRegistry for FixedRegistry {
    fn lookup(&self, parms_id: &ParmsId) -> Option<ParmsEntry<'_>> {
        (*parms_id == self.id).then(|| ParmsEntry {
            degree: self.degree,
            coeff_modulus: &self.moduli,
            is_valid: true,
        })
    }

    fn first_parms_id(&self) -> ParmsId {
        self.id
    }
}

#[test]
fn empty_reserved_sized_released() {
    let ctx = small_context();
    let mut ct = Ciphertext::new();
    assert_eq!(ct.size_capacity(), 0);

    ct.reserve_first(&ctx, 4).unwrap();
    assert_eq!(ct.size(), 0);
    assert_eq!(ct.size_capacity(), 4);

    ct.resize_current(3).unwrap();
    assert_eq!(ct.size(), 3);
    assert_eq!(ct.data().len(), 3 * 8 * 2);
    assert!(ct.data().iter().all(|&c| c == 0));

    ct.release();
    assert_eq!(ct, Ciphertext::new());
    assert_eq!(ct.size_capacity(), 0);
    ct.release();
    assert_eq!(ct, Ciphertext::new());
}

#[test]
fn reserve_after_release_matches_fresh_reserve() {
    let ctx = small_context();
    let mut used = Ciphertext::new();
    used.resize_first(&ctx, 5).unwrap();
    used.data_mut().fill(3);
    used.set_scale(8.0);
    used.release();
    used.reserve_first(&ctx, 2).unwrap();

    let mut fresh = Ciphertext::new();
    fresh.reserve_first(&ctx, 2).unwrap();
    assert_eq!(used, fresh);
    assert_eq!(used.size_capacity(), fresh.size_capacity());
}

#[test]
fn growth_preserves_prefix_and_zeroes_tail() {
    let ctx = small_context();
    let mut ct = Ciphertext::new();
    ct.resize_first(&ctx, 2).unwrap();
    for (i, c) in ct.data_mut().iter_mut().enumerate() {
        *c = i as u64 + 1;
    }
    let prefix = ct.data().to_vec();

    ct.resize_current(5).unwrap();
    assert_eq!(&ct.data()[..prefix.len()], prefix.as_slice());
    assert!(ct.data()[prefix.len()..].iter().all(|&c| c == 0));
}

#[test]
fn shrinking_hides_tail_from_checked_access() {
    let ctx = small_context();
    let mut ct = Ciphertext::new();
    ct.resize_first(&ctx, 4).unwrap();
    ct.poly_mut(3).unwrap().fill(9);
    ct.resize_current(2).unwrap();

    assert_eq!(ct.size_capacity(), 4);
    assert_eq!(ct.poly(3).unwrap_err().kind(), ErrorKind::OutOfRange);
    assert_eq!(ct.coeff(32).unwrap_err().kind(), ErrorKind::OutOfRange);

    // Regrowing exposes zeroes, never the stale polynomial.
    ct.resize_current(4).unwrap();
    assert!(ct.poly(3).unwrap().iter().all(|&c| c == 0));
}

#[test]
fn failed_resize_leaves_state_untouched() {
    let ctx = small_context();
    let mut ct = Ciphertext::new();
    ct.resize_first(&ctx, 2).unwrap();
    ct.data_mut()[5] = 11;
    let before = ct.clone();

    assert_eq!(
        ct.resize_current(1),
        Err(CiphertextError::SizeTooSmall { size: 1, min: CIPHERTEXT_SIZE_MIN })
    );
    assert_eq!(ct, before);

    let unknown = ct.resize(&ctx, ParmsId::from_words([1, 2, 3, 4]), 3).unwrap_err();
    assert_eq!(unknown.kind(), ErrorKind::InvalidArgument);
    assert_eq!(ct, before);

    assert_eq!(
        ct.resize_current(CIPHERTEXT_SIZE_MAX + 1),
        Err(CiphertextError::SizeTooLarge {
            size: CIPHERTEXT_SIZE_MAX + 1,
            max: CIPHERTEXT_SIZE_MAX,
        })
    );
    assert_eq!(ct, before);

    let too_large = ct.reserve_current(usize::MAX / 8).unwrap_err();
    assert_eq!(too_large.kind(), ErrorKind::InvalidArgument);
    assert_eq!(ct, before);
    assert_eq!(ct.size_capacity(), 2);
}

#[test]
fn huge_registry_shape_overflows_instead_of_wrapping() {
    let registry = FixedRegistry {
        id: ParmsId::from_words([7; 4]),
        degree: 1 << 62,
        moduli: vec![17; 4],
    };
    let mut ct = Ciphertext::new();
    let err = ct.reserve_first(&registry, CIPHERTEXT_SIZE_MIN).unwrap_err();
    assert!(matches!(err, CiphertextError::Overflow { .. }));
    assert_eq!(ct, Ciphertext::new());
}

#[cfg(target_pointer_width = "64")]
#[test]
fn allocation_past_isize_max_overflows() {
    // 2^59 words per polynomial: 2^63 bytes for two of them.
    let registry = FixedRegistry {
        id: ParmsId::from_words([8; 4]),
        degree: 1 << 55,
        moduli: vec![17; 16],
    };
    let mut ct = Ciphertext::new();
    let err = ct.reserve_first(&registry, CIPHERTEXT_SIZE_MIN).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Overflow);
    assert!(matches!(err, CiphertextError::Overflow { what: "allocation bytes", .. }));
    assert_eq!(ct, Ciphertext::new());
}

#[test]
fn ciphertexts_built_by_resize_stay_within_validity_bounds() {
    let ctx = small_context();
    let mut ct = Ciphertext::new();
    ct.resize_first(&ctx, CIPHERTEXT_SIZE_MAX).unwrap();
    ct.set_ntt_form(true);
    assert!(is_metadata_valid_for(&ct, &ctx, false));

    let before = ct.clone();
    assert!(ct.resize_current(CIPHERTEXT_SIZE_MAX + 1).is_err());
    assert!(ct.reserve_current(CIPHERTEXT_SIZE_MAX + 1).is_err());
    assert_eq!(ct, before);
    assert!(is_metadata_valid_for(&ct, &ctx, false));
}

#[test]
fn copy_is_deep() {
    let ctx = small_context();
    let mut original = Ciphertext::new();
    original.resize_first(&ctx, 2).unwrap();
    original.data_mut().fill(4);

    let mut copy = original.clone();
    copy.data_mut().fill(6);
    copy.set_scale(3.0);
    assert!(original.data().iter().all(|&c| c == 4));
    assert_eq!(original.scale(), 1.0);
    assert_ne!(original, copy);
}

#[test]
fn move_leaves_empty_source() {
    let ctx = small_context();
    let mut source = Ciphertext::new();
    source.resize_first(&ctx, 3).unwrap();
    source.set_ntt_form(true);
    let snapshot = source.clone();

    let target = source.take();
    assert_eq!(target, snapshot);
    assert_eq!(source, Ciphertext::new());
    assert_eq!(source.size_capacity(), 0);
}

#[test]
fn metadata_setters_are_unchecked() {
    let mut ct = Ciphertext::new();
    ct.set_scale(-0.5);
    ct.set_correction_factor(0);
    ct.set_ntt_form(true);
    ct.set_parms_id(ParmsId::from_words([1, 1, 1, 1]));
    assert_eq!(ct.scale(), -0.5);
    assert_eq!(ct.correction_factor(), 0);
    assert!(ct.is_ntt_form());
    assert_eq!(ct.parms_id(), ParmsId::from_words([1, 1, 1, 1]));
    assert_eq!(ct.size(), 0);
}

#[test]
fn generated_parameters_drive_layout() {
    let params = EncryptionParametersBuilder::new(SchemeType::Bgv, 1024)
        .with_prime_bits(vec![40, 30, 30])
        .build()
        .unwrap();
    let ctx = HeContext::new(params);
    assert!(ctx.parameters_set());

    let mut ct = Ciphertext::with_context(&ctx).unwrap();
    ct.resize_current(2).unwrap();
    assert_eq!(ct.poly_modulus_degree(), 1024);
    assert_eq!(ct.coeff_modulus_size(), 2);
    assert_eq!(ct.data().len(), 2 * 2 * 1024);
    assert_eq!(ct.offset(1, 1, 0).unwrap(), 3 * 1024);
    assert_eq!(ct.polys().len(), 2);
}

#[test]
fn modulus_switch_to_lower_level_resets_layout() {
    let ctx = small_context();
    let mut ct = Ciphertext::new();
    ct.resize_first(&ctx, 2).unwrap();
    let next = ctx
        .context_data(&ctx.first_parms_id())
        .and_then(|data| data.next_parms_id())
        .unwrap();

    ct.resize(&ctx, next, 2).unwrap();
    assert_eq!(ct.parms_id(), ctx.last_parms_id());
    assert_eq!(ct.coeff_modulus_size(), 1);
    assert_eq!(ct.data().len(), 16);
}
