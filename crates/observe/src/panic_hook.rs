/// Installs a panic hook that routes panic messages through `tracing` so
/// they end up in the same stream as regular logs. The previous hook still
/// runs afterwards.
pub fn install() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("thread panicked: {info}");
        previous(info);
    }));
}
