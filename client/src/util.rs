pub fn random_index(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    ((js_sys::Math::random() * len as f64) as usize).min(len - 1)
}

pub fn now_ms() -> f64 {
    js_sys::Date::now()
}
