//! The manual's content: a title, a subtitle and a flat list of sections

/// One entry of the outline
///
/// Either field may be empty. An entry with both fields empty is a spacer
/// and only advances the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub content: String,
}

impl Section {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// True when there is nothing to draw
    pub fn is_spacer(&self) -> bool {
        self.title.is_empty() && self.content.is_empty()
    }
}

/// Document outline rendered by the generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outline {
    /// Centered on the first page
    pub title: String,
    /// Centered below the title
    pub subtitle: String,
    pub sections: Vec<Section>,
}

const PRODUCT_MANUAL: &[(&str, &str)] = &[
    ("一、产品概述", ""),
    ("1.1 产品简介", "家庭健康中心是一款专为家庭设计的全方位健康管理应用。"),
    ("1.2 核心功能", ""),
    ("", "· 家庭管理 - 支持添加多名家庭成员"),
    ("", "· 数据记录 - 支持8种健康指标记录"),
    ("", "· 统计分析 - 可视化图表展示健康趋势"),
    ("", "· 智能预警 - 异常数据自动提醒"),
    ("", "· 数据导出 - 方便备份和分享"),
    ("", ""),
    ("1.3 支持的数据类型", ""),
    ("", "血压、心率、血糖、体温、体重、身高、步数、睡眠"),
    ("", ""),
    ("二、快速开始", ""),
    ("2.1 注册账号", "1. 打开应用 2. 填写手机号 3. 获取验证码"),
    ("", "4. 设置密码 5. 完成注册"),
    ("", ""),
    ("2.2 登录应用", "输入手机号和密码，点击登录"),
    ("", ""),
    ("三、功能使用指南", ""),
    ("3.1 应用导航", "首页、成员、数据、预警、我的 五个Tab"),
    ("", ""),
    ("3.2 添加成员", "1. 进入成员页面 2. 点击+按钮"),
    ("", "3. 填写信息 4. 保存"),
    ("", ""),
    ("3.3 录入健康数据", "1. 选择数据类型 2. 选择成员"),
    ("", "3. 输入数值 4. 保存"),
    ("", ""),
    ("3.4 健康统计", "1. 进入数据Tab 2. 点击统计图标"),
    ("", "3. 查看图表和趋势分析"),
    ("", ""),
    ("四、常见问题", ""),
    ("Q: 忘记密码？", "A: 使用忘记密码功能找回"),
    ("Q: 删除数据能恢复？", "A: 不能恢复，删除前请确认"),
    ("Q: 如何联系客服？", "A: 应用内帮助与反馈"),
    ("", ""),
    ("五、技术支持", ""),
    ("客服邮箱", "support@example.com"),
    ("服务时间", "周一至周日 9:00-21:00"),
    ("", ""),
    ("", "感谢您使用家庭健康中心！"),
];

impl Outline {
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            sections,
        }
    }

    /// The built-in Family Health Center user manual
    pub fn product_manual() -> Self {
        let sections = PRODUCT_MANUAL
            .iter()
            .map(|(title, content)| Section::new(*title, *content))
            .collect();

        Self::new("家庭健康中心 APP", "产品使用说明书", sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_manual_shape() {
        let outline = Outline::product_manual();
        assert_eq!(outline.title, "家庭健康中心 APP");
        assert_eq!(outline.subtitle, "产品使用说明书");
        assert_eq!(outline.sections.len(), 40);
        assert_eq!(outline.sections[0], Section::new("一、产品概述", ""));
        assert_eq!(
            outline.sections.last().map(|s| s.content.as_str()),
            Some("感谢您使用家庭健康中心！")
        );
    }

    #[test]
    fn test_spacers_are_kept() {
        let outline = Outline::product_manual();
        let spacers = outline.sections.iter().filter(|s| s.is_spacer()).count();
        assert_eq!(spacers, 10);
    }
}
