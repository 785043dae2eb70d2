//! 標準環境変数解決実装（std::env を委譲）

use crate::ports::outbound::EnvResolver;
use std::collections::HashMap;
use std::env;

/// 標準環境変数解決実装
#[derive(Debug, Clone, Default)]
pub struct StdEnvResolver;

impl EnvResolver for StdEnvResolver {
    fn var(&self, name: &str) -> Option<String> {
        env::var(name).ok().filter(|s| !s.is_empty())
    }
}

/// 固定のマップから読む EnvResolver（テスト用）
#[derive(Debug, Clone, Default)]
pub struct MapEnvResolver {
    vars: HashMap<String, String>,
}

impl MapEnvResolver {
    pub fn new<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl EnvResolver for MapEnvResolver {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).filter(|s| !s.is_empty()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn resolve_home_prefers_gitplm_home() {
        let env = MapEnvResolver::new([("GITPLM_HOME", "/opt/plm"), ("HOME", "/home/u")]);
        let home = env.resolve_home_dir().unwrap();
        assert_eq!(home.as_path(), PathBuf::from("/opt/plm").as_path());
    }

    #[test]
    fn resolve_home_falls_back_to_xdg_then_home() {
        let env = MapEnvResolver::new([("XDG_CONFIG_HOME", "/xdg"), ("HOME", "/home/u")]);
        assert_eq!(
            env.resolve_home_dir().unwrap().as_path(),
            PathBuf::from("/xdg/gitplm").as_path()
        );

        let env = MapEnvResolver::new([("HOME", "/home/u")]);
        assert_eq!(
            env.resolve_home_dir().unwrap().as_path(),
            PathBuf::from("/home/u/.config/gitplm").as_path()
        );
    }

    #[test]
    fn resolve_home_without_home_is_env_error() {
        let env = MapEnvResolver::new([("HOME", "")]);
        let err = env.resolve_home_dir().unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }
}
