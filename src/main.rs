// ==========================================
// 车间生产执行跟踪系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 说明: 装配 AppState 并输出就绪信息；
//       HTTP 传输由外层适配器挂接本库的 API 实例
// ==========================================

use shopfloor_mes::app::{get_default_db_path, AppState};
use shopfloor_mes::logging;

fn main() {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", shopfloor_mes::APP_NAME);
    tracing::info!("系统版本: {}", shopfloor_mes::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState
    tracing::info!("正在初始化AppState...");
    let app_state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("无法初始化AppState: {}", e);
            std::process::exit(1);
        }
    };

    // 应用默认语言
    match app_state.config.get_default_locale() {
        Ok(locale) => shopfloor_mes::i18n::set_locale(&locale),
        Err(e) => tracing::warn!("读取默认语言失败(使用 zh-CN): {}", e),
    }

    tracing::info!("AppState初始化成功，系统就绪");
}
