/// 어떤 키워드에도 걸리지 않은 상권에 붙는 라벨
pub const UNCLASSIFIED: &str = "기타/미분류";

// 순서가 곧 우선순위: 먼저 나온 키워드가 이긴다 ("강남역"은 "압구정"보다 앞)
pub const KEYWORD_TO_BOROUGH: &[(&str, &str)] = &[
    ("종로", "종로구"), ("혜화", "종로구"), ("창신", "종로구"), ("인사동", "종로구"),
    ("명동", "중구"), ("남대문", "중구"), ("북창동", "중구"), ("을지로", "중구"),
    ("이태원", "용산구"), ("한남", "용산구"), ("보광", "용산구"), ("용산", "용산구"),
    ("마장", "성동구"), ("성수", "성동구"), ("행당", "성동구"),
    ("건대", "광진구"), ("준양", "광진구"), ("화양", "광진구"), ("자양", "광진구"),
    ("장안", "동대문구"), ("청량리", "동대문구"), ("제기", "동대문구"),
    ("면목", "중랑구"), ("상봉", "중랑구"), ("중화", "중랑구"),
    ("돈암", "성북구"), ("안암", "성북구"), ("종암", "성북구"),
    ("수유", "강북구"), ("미아", "강북구"), ("번동", "강북구"),
    ("쌍문", "도봉구"), ("창동", "도봉구"), ("방학", "도봉구"),
    ("상계", "노원구"), ("중계", "노원구"), ("하계", "노원구"),
    ("연서", "은평구"), ("응암", "은평구"), ("불광", "은평구"),
    ("이대", "서대문구"), ("신촌", "서대문구"), ("연희", "서대문구"),
    ("홍대", "마포구"), ("합정", "마포구"), ("망원", "마포구"), ("공덕", "마포구"),
    ("목동", "양천구"), ("신정", "양천구"), ("신월", "양천구"),
    ("화곡", "강서구"), ("발산", "강서구"), ("마곡", "강서구"),
    ("구로", "구로구"), ("개봉", "구로구"), ("오류", "구로구"), ("신도림", "구로구"),
    ("가산", "금천구"), ("시흥", "금천구"), ("독산", "금천구"),
    ("영등포", "영등포구"), ("당산", "영등포구"), ("문래", "영등포구"), ("여의도", "영등포구"),
    ("노량진", "동작구"), ("상도", "동작구"), ("사당", "동작구"), ("흑석", "동작구"),
    ("신림", "관악구"), ("봉천", "관악구"), ("남현", "관악구"),
    ("강남역", "서초구"), ("교대", "서초구"), ("방배", "서초구"), ("양재", "서초구"),
    ("압구정", "강남구"), ("청담", "강남구"), ("삼성동", "강남구"), ("역삼", "강남구"),
    ("논현", "강남구"), ("신사", "강남구"), ("가로수길", "강남구"),
    ("잠실", "송파구"), ("가락", "송파구"), ("문정", "송파구"), ("석촌", "송파구"),
    ("천호", "강동구"), ("명일", "강동구"), ("암사", "강동구"), ("성내", "강동구"),
];

/// 상권명 -> 자치구 매핑 테이블
#[derive(Debug, Clone, Copy)]
pub struct BoroughIndex {
    entries: &'static [(&'static str, &'static str)],
}

impl Default for BoroughIndex {
    fn default() -> Self {
        Self::new(KEYWORD_TO_BOROUGH)
    }
}

impl BoroughIndex {
    pub fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        BoroughIndex { entries }
    }

    /// 상권명에 포함된 첫 번째 키워드의 자치구를 돌려준다.
    /// 대소문자 구분, 정규화 없음. 매칭이 없으면 [`UNCLASSIFIED`].
    pub fn classify(&self, area_name: &str) -> &'static str {
        self.entries
            .iter()
            .find(|(keyword, _)| area_name.contains(keyword))
            .map(|&(_, borough)| borough)
            .unwrap_or(UNCLASSIFIED)
    }

    /// 테이블에 등장하는 자치구 (삽입 순서, 중복 제거)
    pub fn boroughs(&self) -> Vec<&'static str> {
        let mut seen = Vec::new();
        for &(_, borough) in self.entries {
            if !seen.contains(&borough) {
                seen.push(borough);
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
