mod common;

#[cfg(test)]
mod dispatcher_tests {
    use std::sync::Arc;

    use deflate_accel::accelerator::{Accelerator, NullAccelerator};
    use deflate_accel::compression::{max_compressed_size, CompressionCodec, DecompressMode, DeflateAccelCodec};
    use deflate_accel::pool::JobPool;
    use deflate_accel::types::CodecError;

    use crate::common::{
        emulated_pool, emulated_pool_thorough, pool_of, pool_with_retries, sample_noise, sample_text,
        FaultyAccelerator, RejectingAccelerator,
    };

    fn compress_with<A: Accelerator>(codec: &mut DeflateAccelCodec<A>, raw: &[u8]) -> Vec<u8> {
        let mut packed = vec![0u8; codec.max_compressed_size(raw.len())];
        let n = codec.compress(raw, &mut packed).unwrap();
        packed.truncate(n);
        packed
    }

    /// Decompress every block in `mode` with one codec, flush, and return the outputs.
    fn decompress_all<A: Accelerator>(
        pool: &Arc<JobPool<A>>,
        mode: DecompressMode,
        blocks: &[(Vec<u8>, usize)],
    ) -> Vec<Vec<u8>> {
        let mut outs: Vec<Vec<u8>> = blocks.iter().map(|(_, len)| vec![0u8; *len]).collect();
        let mut codec = DeflateAccelCodec::with_pool(Arc::clone(pool));
        codec.set_decompress_mode(mode);

        let mut batch = codec.batch();
        for ((packed, _), out) in blocks.iter().zip(outs.iter_mut()) {
            batch.decompress(packed, out).unwrap();
        }
        batch.flush().unwrap();

        assert_eq!(codec.decompress_mode(), DecompressMode::Synchronous);
        assert_eq!(pool.held(), 0);
        outs
    }

    fn corpus() -> Vec<Vec<u8>> {
        vec![sample_text(8000), Vec::new(), sample_noise(3000, 9), b"x".to_vec(), sample_text(65_536)]
    }

    fn round_trip<A: Accelerator>(pool: Arc<JobPool<A>>, mode: DecompressMode) {
        let raws = corpus();
        let mut codec = DeflateAccelCodec::with_pool(Arc::clone(&pool));
        let blocks: Vec<(Vec<u8>, usize)> = raws.iter().map(|r| (compress_with(&mut codec, r), r.len())).collect();

        assert_eq!(decompress_all(&pool, mode, &blocks), raws);
    }

    #[test]
    fn round_trip_with_device_sync() {
        round_trip(emulated_pool(&[4]), DecompressMode::Synchronous);
    }

    #[test]
    fn round_trip_with_device_async() {
        round_trip(emulated_pool_thorough(&[8]), DecompressMode::Asynchronous);
    }

    #[test]
    fn round_trip_without_device_sync() {
        round_trip(pool_of(NullAccelerator), DecompressMode::Synchronous);
    }

    #[test]
    fn round_trip_without_device_async() {
        round_trip(pool_of(NullAccelerator), DecompressMode::Asynchronous);
    }

    #[test]
    fn round_trip_software_mode() {
        round_trip(emulated_pool(&[4]), DecompressMode::SoftwareFallback);
    }

    #[test]
    fn hardware_path_is_used_when_ready() {
        let pool = emulated_pool(&[4]);
        let raw = sample_text(4096);
        let mut out = vec![0u8; raw.len()];

        let mut codec = DeflateAccelCodec::with_pool(Arc::clone(&pool));
        let packed = compress_with(&mut codec, &raw);
        codec.decompress(&packed, &mut out).unwrap();

        assert_eq!(out, raw);

        let counters = codec.counters();
        assert_eq!(counters.hw_compress, 1);
        assert_eq!(counters.hw_decompress_sync, 1);
        assert_eq!(counters.software_ops(), 0);
        assert_eq!(counters.hw_fallbacks, 0);
    }

    #[test]
    fn software_path_is_used_without_device() {
        let raw = sample_text(4096);
        let mut out = vec![0u8; raw.len()];

        let mut codec = DeflateAccelCodec::with_pool(pool_of(NullAccelerator));
        let packed = compress_with(&mut codec, &raw);
        codec.decompress(&packed, &mut out).unwrap();

        assert_eq!(out, raw);

        let counters = codec.counters();
        assert_eq!(counters.sw_compress, 1);
        assert_eq!(counters.sw_decompress, 1);
        assert_eq!(counters.hardware_ops(), 0);
        assert_eq!(counters.hw_fallbacks, 0, "no device means no hardware attempt");
    }

    #[test]
    fn async_results_land_after_flush() {
        let pool = emulated_pool_thorough(&[8]);
        let raws: Vec<Vec<u8>> = (0..5).map(|i| sample_noise(1500, i + 20)).collect();
        let mut packer = DeflateAccelCodec::with_pool(Arc::clone(&pool));
        let blocks: Vec<Vec<u8>> = raws.iter().map(|r| compress_with(&mut packer, r)).collect();
        drop(packer);
        let mut outs = vec![vec![0u8; 1500]; 5];

        let mut codec = DeflateAccelCodec::with_pool(Arc::clone(&pool));
        codec.set_decompress_mode(DecompressMode::Asynchronous);
        let mut batch = codec.batch();
        for (packed, out) in blocks.iter().zip(outs.iter_mut()) {
            batch.decompress(packed, out).unwrap();
        }
        assert_eq!(batch.pending(), 5);
        assert_eq!(batch.snapshot().pending_async, 5);
        assert_eq!(batch.counters().hw_decompress_async, 5);
        batch.flush().unwrap();

        assert_eq!(outs, raws);
        assert_eq!(pool.held(), 0);
        assert_eq!(codec.decompress_mode(), DecompressMode::Synchronous);
        assert_eq!(codec.counters().flushes, 1);
    }

    #[test]
    fn flush_always_returns_to_sync_mode() {
        let mut with_device = DeflateAccelCodec::with_pool(emulated_pool(&[2]));
        let mut without_device = DeflateAccelCodec::with_pool(pool_of(NullAccelerator));

        for mode in [DecompressMode::Asynchronous, DecompressMode::SoftwareFallback] {
            with_device.set_decompress_mode(mode);
            with_device.flush().unwrap();
            assert_eq!(with_device.decompress_mode(), DecompressMode::Synchronous);

            without_device.set_decompress_mode(mode);
            without_device.flush().unwrap();
            assert_eq!(without_device.decompress_mode(), DecompressMode::Synchronous);
        }
        assert_eq!(with_device.counters().flushes, 2);
    }

    #[test]
    fn rejected_submissions_fall_back_transparently() {
        let pool = pool_of(RejectingAccelerator { depths: vec![4] });
        let raw = sample_text(3000);
        let mut sync_out = vec![0u8; raw.len()];
        let mut async_out = vec![0u8; raw.len()];

        let mut codec = DeflateAccelCodec::with_pool(Arc::clone(&pool));
        let packed = compress_with(&mut codec, &raw);
        codec.decompress(&packed, &mut sync_out).unwrap();
        codec.set_decompress_mode(DecompressMode::Asynchronous);
        let mut batch = codec.batch();
        batch.decompress(&packed, &mut async_out).unwrap();
        assert_eq!(batch.pending(), 0);
        batch.flush().unwrap();

        let counters = codec.counters();
        assert_eq!(counters.hw_fallbacks, 3);
        assert_eq!(counters.sw_compress, 1);
        assert_eq!(counters.sw_decompress, 2);

        assert_eq!(sync_out, raw);
        assert_eq!(async_out, raw);
        assert_eq!(pool.held(), 0);
    }

    #[test]
    fn failing_async_jobs_are_redone_at_flush() {
        let pool = pool_with_retries(FaultyAccelerator { depths: vec![4], busy_polls: 2 }, 10_000);
        let raws = [sample_text(700), sample_noise(900, 4)];
        let mut software = DeflateAccelCodec::with_pool(pool_of(NullAccelerator));
        let blocks: Vec<Vec<u8>> = raws.iter().map(|r| compress_with(&mut software, r)).collect();
        drop(software);
        let mut a = vec![0u8; raws[0].len()];
        let mut b = vec![0u8; raws[1].len()];

        let mut codec = DeflateAccelCodec::with_pool(Arc::clone(&pool));
        codec.set_decompress_mode(DecompressMode::Asynchronous);
        let mut batch = codec.batch();
        batch.decompress(&blocks[0], &mut a).unwrap();
        batch.decompress(&blocks[1], &mut b).unwrap();
        assert_eq!(batch.pending(), 2);
        batch.flush().unwrap();

        assert_eq!(codec.counters().hw_fallbacks, 2);
        assert_eq!(codec.counters().sw_decompress, 2);

        assert_eq!(a, raws[0]);
        assert_eq!(b, raws[1]);
    }

    #[test]
    fn exhausted_pool_degrades_to_software() {
        let pool = emulated_pool(&[1]);
        let raw = sample_text(2048);
        let packed = compress_with(&mut DeflateAccelCodec::with_pool(Arc::clone(&pool)), &raw);
        let mut outs = vec![vec![0u8; raw.len()]; 3];

        let mut codec = DeflateAccelCodec::with_pool(Arc::clone(&pool));
        codec.set_decompress_mode(DecompressMode::Asynchronous);
        let mut batch = codec.batch();
        for out in outs.iter_mut() {
            batch.decompress(&packed, out).unwrap();
        }
        assert_eq!(batch.counters().hw_decompress_async, 1);
        assert_eq!(batch.counters().sw_decompress, 2);
        assert_eq!(batch.counters().hw_fallbacks, 2);
        batch.flush().unwrap();

        assert!(outs.iter().all(|o| *o == raw));
    }

    #[test]
    fn corrupt_input_surfaces_software_error() {
        let garbage = [0xffu8; 40];
        let mut out = vec![0u8; 100];
        let mut codec = DeflateAccelCodec::with_pool(emulated_pool(&[2]));
        let err = codec.decompress(&garbage, &mut out).unwrap_err();
        assert!(matches!(err, CodecError::Decompress(_)));
        assert_eq!(codec.counters().hw_fallbacks, 1);
    }

    #[test]
    fn corrupt_async_input_fails_at_flush() {
        let garbage = [0xffu8; 40];
        let mut out = vec![0u8; 100];
        let pool = emulated_pool(&[2]);
        let mut codec = DeflateAccelCodec::with_pool(Arc::clone(&pool));
        codec.set_decompress_mode(DecompressMode::Asynchronous);
        let mut batch = codec.batch();
        batch.decompress(&garbage, &mut out).unwrap();

        assert!(matches!(batch.flush(), Err(CodecError::Decompress(_))));
        assert_eq!(codec.decompress_mode(), DecompressMode::Synchronous);
        assert_eq!(pool.held(), 0);
    }

    #[test]
    fn compress_never_writes_past_the_bound() {
        let raw = sample_noise(1000, 13);
        let bound = max_compressed_size(raw.len());
        let mut dest = vec![0xaau8; bound + 64];

        let mut codec = DeflateAccelCodec::with_pool(emulated_pool(&[2]));
        let n = codec.compress(&raw, &mut dest).unwrap();
        assert!(n <= bound);
        assert!(dest[bound..].iter().all(|&b| b == 0xaa));
    }

    #[test]
    fn compress_into_short_buffer_is_an_error() {
        let raw = sample_noise(1000, 17);
        let mut dest = [0u8; 8];
        let mut codec = DeflateAccelCodec::with_pool(emulated_pool(&[2]));
        assert!(matches!(codec.compress(&raw, &mut dest), Err(CodecError::Compress(_))));
        assert_eq!(codec.counters().hw_fallbacks, 1);
    }

    #[test]
    fn usable_as_trait_object() {
        let raw = sample_text(1024);
        let mut out = vec![0u8; raw.len()];
        let mut packed = vec![0u8; max_compressed_size(raw.len())];

        let mut codec: Box<dyn CompressionCodec> = Box::new(DeflateAccelCodec::with_pool(emulated_pool(&[2])));
        assert_eq!(codec.method_byte(), 0x99);
        assert_eq!(codec.name(), "DEFLATE_QPL");
        let n = codec.compress(&raw, &mut packed).unwrap();

        codec.set_decompress_mode(DecompressMode::Asynchronous);
        assert_eq!(codec.decompress_mode(), DecompressMode::Asynchronous);
        codec.decompress(&packed[..n], &mut out).unwrap();
        assert_eq!(out, raw, "a plain borrow completes before the call returns");

        codec.flush().unwrap();
        assert_eq!(codec.decompress_mode(), DecompressMode::Synchronous);
    }

    #[test]
    fn long_lived_codec_reuses_output_buffer() {
        let raws = [sample_text(3000), sample_noise(3000, 31), sample_text(3000)];
        let mut codec = DeflateAccelCodec::with_pool(emulated_pool(&[2]));
        let blocks: Vec<Vec<u8>> = raws.iter().map(|r| compress_with(&mut codec, r)).collect();

        let mut out = vec![0u8; 3000];
        for mode in [DecompressMode::Synchronous, DecompressMode::SoftwareFallback, DecompressMode::Asynchronous] {
            codec.set_decompress_mode(mode);
            for (packed, raw) in blocks.iter().zip(raws.iter()) {
                codec.decompress(packed, &mut out).unwrap();
                assert_eq!(&out, raw);
            }
        }
        assert_eq!(codec.counters().sw_decompress, 3);
    }

    #[test]
    fn codec_is_reusable_after_batch_flush() {
        let pool = emulated_pool_thorough(&[4]);
        let raw = sample_noise(2500, 41);
        let mut codec = DeflateAccelCodec::with_pool(Arc::clone(&pool));
        let packed = compress_with(&mut codec, &raw);
        let mut out = vec![0u8; raw.len()];

        for _ in 0..3 {
            codec.set_decompress_mode(DecompressMode::Asynchronous);
            let mut batch = codec.batch();
            batch.decompress(&packed, &mut out).unwrap();
            batch.flush().unwrap();
            assert_eq!(out, raw);
            out.fill(0);
        }
        assert_eq!(codec.counters().flushes, 3);
        assert_eq!(pool.held(), 0);
    }

    #[test]
    fn dropped_batch_still_completes_its_jobs() {
        let pool = emulated_pool_thorough(&[4]);
        let raw = sample_text(4000);
        let mut codec = DeflateAccelCodec::with_pool(Arc::clone(&pool));
        let packed = compress_with(&mut codec, &raw);
        let mut out = vec![0u8; raw.len()];

        codec.set_decompress_mode(DecompressMode::Asynchronous);
        {
            let mut batch = codec.batch();
            batch.decompress(&packed, &mut out).unwrap();
        }

        assert_eq!(out, raw);
        assert_eq!(pool.held(), 0);
        assert_eq!(codec.decompress_mode(), DecompressMode::Synchronous);
    }

    #[test]
    fn empty_blocks_round_trip_through_async_hardware() {
        let pool = emulated_pool_thorough(&[4]);
        let mut codec = DeflateAccelCodec::with_pool(Arc::clone(&pool));
        let packed = compress_with(&mut codec, &[]);
        assert_eq!(codec.counters().hw_compress, 1);
        let mut outs = vec![Vec::new(), Vec::new()];

        codec.set_decompress_mode(DecompressMode::Asynchronous);
        let mut batch = codec.batch();
        for out in outs.iter_mut() {
            batch.decompress(&packed, out).unwrap();
        }
        batch.flush().unwrap();

        assert!(outs.iter().all(|o| o.is_empty()));
        assert_eq!(codec.counters().hw_decompress_async, 2);
        assert_eq!(codec.counters().hw_fallbacks, 0);
    }
}
