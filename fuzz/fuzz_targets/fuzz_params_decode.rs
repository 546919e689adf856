#![no_main]

use libfuzzer_sys::fuzz_target;

use mutual_pool::PoolConfig;
use mutual_types::PoolParams;

// Decoding stored parameters or a config file must never panic, and whatever
// validates must survive a round trip.
fuzz_target!(|data: &[u8]| {
    if let Ok(params) = bincode::deserialize::<PoolParams>(data) {
        if params.validate().is_ok() {
            let bytes = bincode::serialize(&params).expect("serialize valid params");
            let back: PoolParams = bincode::deserialize(&bytes).expect("decode own output");
            assert_eq!(back, params);
        }
    }

    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(config) = PoolConfig::from_toml_str(text) {
            let rendered = config.to_toml_string().expect("render valid config");
            let _ = PoolConfig::from_toml_str(&rendered).expect("reparse own output");
        }
    }
});
